//! Full taxonomy graph held as a dense node arena.
//!
//! Every node is addressed by a [`NodeId`], an index into [`GraphData::nodes`].
//! Links store endpoint ids, never references, so the graph can be shared
//! read-only between the loader, the simulation and the viewer.

mod build;
pub mod dataset;

use std::collections::HashMap;
use std::fmt;

use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

pub use build::RadiusConfig;
pub use dataset::{GraphDataset, LinkRecord, NodeRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Unknown,
    NeedsWork,
    Optimal,
}

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: NodeId,
    pub key: String,
    pub label: String,
    pub depth: u32,
    pub parent: Option<NodeId>,
    /// Business metric (traffic, product count...). Never negative.
    pub metric: f32,
    pub category: Option<String>,
    pub status: NodeStatus,
    /// Derived from `metric`, always within the configured radius range.
    pub radius: f32,
    /// Position supplied by the data source, if any.
    pub seed_position: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphLink {
    pub source: NodeId,
    pub target: NodeId,
    pub strength: Option<f32>,
}

impl GraphLink {
    pub fn other(&self, id: NodeId) -> NodeId {
        if self.source == id {
            self.target
        } else {
            self.source
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    EmptyKey { position: usize },
    DuplicateKey(String),
    ParentCycle(String),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey { position } => write!(f, "node at position {position} has an empty id"),
            Self::DuplicateKey(key) => write!(f, "duplicate node id {key:?}"),
            Self::ParentCycle(key) => write!(f, "parent chain of {key:?} forms a cycle"),
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Clone, Debug, Default)]
pub struct GraphData {
    nodes: Vec<GraphNode>,
    links: Vec<GraphLink>,
    index_by_key: HashMap<String, NodeId>,
    incident: Vec<Vec<usize>>,
    max_metric: f32,
}

impl GraphData {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }

    pub fn link(&self, index: usize) -> Option<&GraphLink> {
        self.links.get(index)
    }

    pub fn id_of(&self, key: &str) -> Option<NodeId> {
        self.index_by_key.get(key).copied()
    }

    /// Indices into [`GraphData::links`] touching `id`.
    pub fn incident_links(&self, id: NodeId) -> &[usize] {
        self.incident.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.incident_links(id).len()
    }

    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incident_links(id)
            .iter()
            .map(move |&link| self.links[link].other(id))
    }

    pub fn max_metric(&self) -> f32 {
        self.max_metric
    }
}
