pub mod engine;
pub mod graph;
pub mod loader;
pub mod physics;
pub mod spatial;
pub mod viewport;

mod util;

pub use engine::{EngineConfig, EngineError, FrameSnapshot, GraphEngine};
pub use graph::{GraphData, NodeId};
