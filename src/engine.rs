//! Host-facing engine wiring loader, simulation and viewport together.
//!
//! [`GraphEngine::tick`] is the only scheduler: each call drains at most one
//! loader batch into the simulation and advances the layout by at most one
//! tick. Pointer and zoom input arrive in screen space and are mapped to world
//! space here.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::Context;
use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::{GraphData, NodeId, NodeStatus, RadiusConfig};
use crate::loader::{LoadBatch, LoaderConfig, LoaderError, LoaderEvent, LoadingProgress, ProgressiveLoader};
use crate::physics::{BodySpec, LinkSpec, Simulation, SimulationConfig, SimulationConfigPatch, SimulationError};
use crate::viewport::{ViewTransform, ViewportConfig, ViewportController};

/// Pointer travel, in points, below which a press-release counts as a click.
const CLICK_SLOP: f32 = 4.0;
/// Extra hit radius, in points, around every node.
const HIT_SLOP: f32 = 3.0;
const FIT_PADDING: f32 = 48.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub loader: LoaderConfig,
    pub simulation: SimulationConfig,
    pub viewport: ViewportConfig,
    pub radius: RadiusConfig,
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("invalid engine config JSON")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    Simulation(SimulationError),
    Loader(LoaderError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulation(error) => write!(f, "simulation: {error}"),
            Self::Loader(error) => write!(f, "loader: {error}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Simulation(error) => Some(error),
            Self::Loader(error) => Some(error),
        }
    }
}

impl From<SimulationError> for EngineError {
    fn from(error: SimulationError) -> Self {
        Self::Simulation(error)
    }
}

impl From<LoaderError> for EngineError {
    fn from(error: LoaderError) -> Self {
        Self::Loader(error)
    }
}

/// What one scheduler step did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub added: Vec<NodeId>,
    pub stepped: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameNode {
    pub id: NodeId,
    pub screen: Pos2,
    /// Radius in points at the current zoom.
    pub radius: f32,
    pub depth: u32,
    pub status: NodeStatus,
    pub category: Option<String>,
    pub label: String,
    pub pinned: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameLink {
    pub source: NodeId,
    pub target: NodeId,
    pub start: Pos2,
    pub end: Pos2,
}

/// Everything a renderer needs for one frame, already culled to the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub transform: ViewTransform,
    pub surface: Vec2,
    pub nodes: Vec<FrameNode>,
    pub links: Vec<FrameLink>,
    pub progress: LoadingProgress,
    pub alpha: f32,
    pub hovered: Option<NodeId>,
    pub selected: Option<NodeId>,
    pub show_labels: bool,
}

#[derive(Clone, Copy, Debug)]
enum Gesture {
    Idle,
    Dragging { id: NodeId, origin: Pos2, moved: bool },
    Panning { last: Pos2 },
}

pub struct GraphEngine {
    config: EngineConfig,
    graph: Option<Arc<GraphData>>,
    loader: ProgressiveLoader,
    simulation: Simulation,
    viewport: ViewportController,
    gesture: Gesture,
    hovered: Option<NodeId>,
    selected: Option<NodeId>,
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            loader: ProgressiveLoader::new(config.loader),
            simulation: Simulation::new(config.simulation.clone()),
            viewport: ViewportController::new(config.viewport),
            config,
            graph: None,
            gesture: Gesture::Idle,
            hovered: None,
            selected: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> Option<&Arc<GraphData>> {
        self.graph.as_ref()
    }

    pub fn loader(&self) -> &ProgressiveLoader {
        &self.loader
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn progress(&self) -> LoadingProgress {
        self.loader.progress()
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn subscribe(&mut self) -> Receiver<LoaderEvent> {
        self.loader.subscribe()
    }

    fn body_specs(graph: &GraphData, nodes: &[NodeId]) -> Vec<BodySpec> {
        nodes
            .iter()
            .filter_map(|&id| graph.node(id))
            .map(|node| BodySpec {
                id: node.id,
                depth: node.depth,
                radius: node.radius,
                position: node.seed_position,
            })
            .collect()
    }

    fn link_specs(graph: &GraphData, links: &[usize]) -> Vec<LinkSpec> {
        links
            .iter()
            .filter_map(|&index| graph.link(index))
            .map(|link| LinkSpec {
                source: link.source,
                target: link.target,
                strength: link.strength,
            })
            .collect()
    }

    /// Starts a session on `graph`: core nodes are activated and laid out
    /// from scratch.
    pub fn load_graph(&mut self, graph: Arc<GraphData>) -> Result<LoadBatch, EngineError> {
        let batch = self.loader.initialize(Arc::clone(&graph))?;
        self.simulation.initialize(
            Self::body_specs(&graph, &batch.nodes),
            &Self::link_specs(&graph, &batch.links),
            true,
        )?;
        self.graph = Some(graph);
        self.gesture = Gesture::Idle;
        self.hovered = None;
        self.selected = None;
        info!(
            active = batch.nodes.len(),
            total = batch.progress.total,
            "graph session started"
        );
        Ok(batch)
    }

    pub fn set_surface(&mut self, width: f32, height: f32, pixels_per_point: f32) {
        self.viewport.set_surface(width, height, pixels_per_point);
    }

    /// One scheduler step.
    pub fn tick(&mut self, elapsed: Duration) -> Result<TickReport, EngineError> {
        let Some(graph) = self.graph.clone() else {
            return Ok(TickReport::default());
        };

        let mut report = TickReport::default();
        if let Some(batch) = self.loader.tick(elapsed) {
            report.added = self.simulation.add_nodes(
                Self::body_specs(&graph, &batch.nodes),
                &Self::link_specs(&graph, &batch.links),
            )?;
        }
        report.stepped = self.simulation.tick()?;
        Ok(report)
    }

    /// Synchronous layout for hosts that do not animate.
    pub fn settle(&mut self, max_ticks: usize) -> Result<usize, EngineError> {
        if self.graph.is_none() {
            return Ok(0);
        }
        Ok(self.simulation.run_to_rest(max_ticks)?)
    }

    pub fn fit_to_view(&mut self) -> bool {
        match self.simulation.extent() {
            Some(extent) => self.viewport.fit_to_view(extent, FIT_PADDING),
            None => false,
        }
    }

    pub fn frame(&self) -> FrameSnapshot {
        let transform = self.viewport.transform();
        let mut nodes = Vec::new();
        let mut links = Vec::new();

        if let Some(graph) = &self.graph {
            for body in self.simulation.bodies() {
                if !self.viewport.circle_on_screen(body.position, body.radius) {
                    continue;
                }
                let Some(node) = graph.node(body.id) else {
                    continue;
                };
                nodes.push(FrameNode {
                    id: body.id,
                    screen: transform.world_to_screen(body.position),
                    radius: body.radius * transform.scale,
                    depth: body.depth,
                    status: node.status,
                    category: node.category.clone(),
                    label: node.label.clone(),
                    pinned: body.pinned.is_some(),
                });
            }

            for link in self.simulation.links() {
                let (Some(start), Some(end)) = (
                    self.simulation.position(link.source),
                    self.simulation.position(link.target),
                ) else {
                    continue;
                };
                if !self.viewport.segment_on_screen(start, end, 1.0) {
                    continue;
                }
                links.push(FrameLink {
                    source: link.source,
                    target: link.target,
                    start: transform.world_to_screen(start),
                    end: transform.world_to_screen(end),
                });
            }
        }

        FrameSnapshot {
            transform,
            surface: self.viewport.surface_size(),
            nodes,
            links,
            progress: self.loader.progress(),
            alpha: self.simulation.alpha(),
            hovered: self.hovered,
            selected: self.selected,
            show_labels: transform.scale >= self.config.loader.min_zoom_for_details,
        }
    }

    pub fn node_at(&self, screen: Pos2) -> Option<NodeId> {
        self.viewport.node_at_screen(&self.simulation, screen, HIT_SLOP)
    }

    /// Press on a node starts a drag; anywhere else starts a pan.
    pub fn pointer_down(&mut self, screen: Pos2) -> Result<Option<NodeId>, EngineError> {
        if self.graph.is_none() {
            return Ok(None);
        }
        match self.node_at(screen) {
            Some(id) if self.simulation.drag_start(id)? => {
                self.gesture = Gesture::Dragging {
                    id,
                    origin: screen,
                    moved: false,
                };
                Ok(Some(id))
            }
            _ => {
                self.gesture = Gesture::Panning { last: screen };
                Ok(None)
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Pos2) -> Result<(), EngineError> {
        match self.gesture {
            Gesture::Dragging { id, origin, moved } => {
                let world = self.viewport.screen_to_world(screen);
                self.simulation.drag(id, world.x, world.y)?;
                self.gesture = Gesture::Dragging {
                    id,
                    origin,
                    moved: moved || (screen - origin).length() > CLICK_SLOP,
                };
            }
            Gesture::Panning { last } => {
                self.viewport.pan_by(screen - last);
                self.gesture = Gesture::Panning { last: screen };
            }
            Gesture::Idle => {
                self.hovered = self.node_at(screen);
            }
        }
        Ok(())
    }

    /// Ends the current gesture. A drag that never left the click slop
    /// selects the node; a finished pan asks the loader for the new area.
    pub fn pointer_up(&mut self, screen: Pos2) -> Result<(), EngineError> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Dragging { id, moved, .. } => {
                self.simulation.drag_end(id)?;
                if !moved {
                    self.selected = if self.selected == Some(id) { None } else { Some(id) };
                }
            }
            Gesture::Panning { .. } => {
                self.request_viewport()?;
            }
            Gesture::Idle => {}
        }
        self.hovered = self.node_at(screen);
        Ok(())
    }

    /// Wheel zoom around the cursor; `delta` in scroll points.
    pub fn scroll_zoom(&mut self, screen: Pos2, delta: f32) -> Result<(), EngineError> {
        if delta.abs() <= f32::EPSILON {
            return Ok(());
        }
        let factor = (1.0 + (delta * 0.0018)).clamp(0.85, 1.15);
        self.viewport.zoom_at(screen, factor);
        self.request_viewport()
    }

    pub fn pan_by(&mut self, delta: Vec2) -> Result<(), EngineError> {
        self.viewport.pan_by(delta);
        self.request_viewport()
    }

    fn request_viewport(&mut self) -> Result<(), EngineError> {
        let queued = self.loader.update_viewport(self.viewport.current_bounds())?;
        if queued > 0 {
            debug!(queued, "viewport change queued nodes");
        }
        Ok(())
    }

    pub fn show_connected(&mut self, id: NodeId, depth: usize) -> Result<usize, EngineError> {
        Ok(self.loader.load_connected_nodes(id, depth)?)
    }

    pub fn show_all(&mut self) -> Result<usize, EngineError> {
        Ok(self.loader.load_all_nodes()?)
    }

    pub fn update_simulation(&mut self, patch: SimulationConfigPatch) -> Result<(), EngineError> {
        self.simulation.update_config(patch)?;
        self.config.simulation = self.simulation.config().clone();
        Ok(())
    }

    /// Restarts the session on the current graph from the core set.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.loader.reset();
        match self.graph.take() {
            Some(graph) => self.load_graph(graph).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn destroy(&mut self) {
        self.loader.destroy();
        self.simulation.destroy();
        self.graph = None;
        self.gesture = Gesture::Idle;
        self.hovered = None;
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphDataset, LinkRecord, NodeRecord};
    use eframe::egui::pos2;

    fn star(leaves: usize) -> Arc<GraphData> {
        let mut nodes = vec![NodeRecord {
            id: "root".into(),
            depth: Some(0),
            ..NodeRecord::default()
        }];
        nodes.extend((0..leaves).map(|index| NodeRecord {
            id: format!("leaf{index}"),
            parent: Some("root".into()),
            ..NodeRecord::default()
        }));
        let dataset = GraphDataset {
            nodes,
            links: Vec::<LinkRecord>::new(),
        };
        Arc::new(GraphData::build(dataset, RadiusConfig::default()).unwrap())
    }

    fn engine(core: usize) -> GraphEngine {
        let mut engine = GraphEngine::new(EngineConfig {
            loader: LoaderConfig {
                core_node_limit: core,
                batch_size: 2,
                ..LoaderConfig::default()
            },
            ..EngineConfig::default()
        });
        engine.set_surface(800.0, 600.0, 1.0);
        engine
    }

    #[test]
    fn config_json_fills_missing_sections_with_defaults() {
        let config = EngineConfig::from_json(r#"{"loader": {"core_node_limit": 2}}"#).unwrap();
        assert_eq!(config.loader.core_node_limit, 2);
        assert_eq!(config.loader.batch_size, 40);
        assert_eq!(config.simulation, SimulationConfig::default());
        assert!(EngineConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn tick_moves_one_batch_into_the_layout() {
        let mut engine = engine(1);
        engine.load_graph(star(5)).unwrap();
        assert_eq!(engine.simulation().len(), 1);

        engine.show_all().unwrap();
        let report = engine.tick(Duration::from_millis(16)).unwrap();
        assert_eq!(report.added.len(), 2);
        assert_eq!(engine.simulation().len(), 3);

        for _ in 0..10 {
            engine.tick(Duration::from_millis(16)).unwrap();
        }
        assert_eq!(engine.simulation().len(), 6);
        assert!(engine.progress().is_complete);
    }

    #[test]
    fn frame_only_contains_visible_nodes() {
        let mut engine = engine(6);
        engine.load_graph(star(5)).unwrap();
        engine.settle(300).unwrap();
        assert!(engine.fit_to_view());
        assert_eq!(engine.frame().nodes.len(), 6);
        assert_eq!(engine.frame().links.len(), 5);

        engine.pan_by(Vec2::splat(10_000.0)).unwrap();
        let frame = engine.frame();
        assert!(frame.nodes.is_empty());
        assert!(frame.links.is_empty());
    }

    #[test]
    fn click_selects_and_drag_pins_under_the_pointer() {
        let mut engine = engine(6);
        engine.load_graph(star(5)).unwrap();
        engine.settle(300).unwrap();
        engine.fit_to_view();

        let root = engine.graph().unwrap().id_of("root").unwrap();
        let screen = engine.viewport().world_to_screen(engine.simulation().position(root).unwrap());

        assert_eq!(engine.pointer_down(screen).unwrap(), Some(root));
        engine.pointer_up(screen).unwrap();
        assert_eq!(engine.selected(), Some(root));

        engine.pointer_down(screen).unwrap();
        let target = screen + Vec2::new(60.0, 0.0);
        engine.pointer_move(target).unwrap();
        let world = engine.viewport().screen_to_world(target);
        assert!((engine.simulation().position(root).unwrap() - world).length() < 1e-3);
        assert!(engine.simulation().body(root).unwrap().pinned.is_some());
        engine.pointer_up(target).unwrap();
        assert!(engine.simulation().body(root).unwrap().pinned.is_none());
        assert_eq!(engine.selected(), Some(root));
    }

    #[test]
    fn empty_space_drag_pans_the_view() {
        let mut engine = engine(6);
        engine.load_graph(star(5)).unwrap();
        let before = engine.viewport().transform().translate;
        assert_eq!(engine.pointer_down(pos2(700.0, 500.0)).unwrap(), None);
        engine.pointer_move(pos2(720.0, 510.0)).unwrap();
        engine.pointer_up(pos2(720.0, 510.0)).unwrap();
        assert_eq!(engine.viewport().transform().translate - before, Vec2::new(20.0, 10.0));
    }

    #[test]
    fn reset_returns_to_core_and_destroy_is_final() {
        let mut engine = engine(2);
        engine.load_graph(star(5)).unwrap();
        engine.show_all().unwrap();
        for _ in 0..5 {
            engine.tick(Duration::from_millis(16)).unwrap();
        }
        engine.reset().unwrap();
        assert_eq!(engine.simulation().len(), 2);
        assert_eq!(engine.loader().active_count(), 2);

        engine.destroy();
        engine.destroy();
        assert_eq!(engine.tick(Duration::from_millis(16)), Ok(TickReport::default()));
        assert!(engine.load_graph(star(1)).is_err());
        assert!(engine.frame().nodes.is_empty());
    }
}
