use std::fmt;

use serde::Serialize;

use crate::graph::NodeId;

/// Stage of progressive loading. `Viewport` and `Connected` can be entered
/// repeatedly; `All` is terminal for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingLevel {
    #[default]
    Core,
    Viewport,
    Connected,
    All,
}

impl LoadingLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Viewport => "viewport",
            Self::Connected => "connected",
            Self::All => "all",
        }
    }
}

impl fmt::Display for LoadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LoadingProgress {
    pub level: LoadingLevel,
    pub loaded: usize,
    pub total: usize,
    pub percentage: f32,
    pub is_complete: bool,
}

impl LoadingProgress {
    pub fn new(level: LoadingLevel, loaded: usize, total: usize) -> Self {
        let loaded = loaded.min(total);
        let percentage = if total == 0 {
            100.0
        } else {
            (loaded as f32 / total as f32) * 100.0
        };
        Self {
            level,
            loaded,
            total,
            percentage,
            is_complete: loaded == total,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoaderEvent {
    Progress(LoadingProgress),
    NodesChanged {
        added: Vec<NodeId>,
        active_nodes: usize,
        active_links: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_tracks_loaded_equals_total() {
        let partial = LoadingProgress::new(LoadingLevel::Viewport, 3, 10);
        assert!(!partial.is_complete);
        assert!((partial.percentage - 30.0).abs() < 1e-4);

        let done = LoadingProgress::new(LoadingLevel::All, 10, 10);
        assert!(done.is_complete);
        assert_eq!(done.percentage, 100.0);

        assert!(LoadingProgress::new(LoadingLevel::Core, 0, 0).is_complete);
    }
}
