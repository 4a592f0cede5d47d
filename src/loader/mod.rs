//! Staged activation of a large graph.
//!
//! The loader ranks every node once, activates the top `core_node_limit`
//! immediately and then grows the active set on explicit triggers. Triggers
//! only fill a queue; nodes move from the queue into the active set one
//! `batch_size` batch per `frame_interval`, driven by [`ProgressiveLoader::tick`].

mod importance;
mod progress;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::graph::{GraphData, NodeId};
use crate::viewport::ViewportBounds;

pub use importance::{ImportanceWeights, importance, rank_nodes};
pub use progress::{LoaderEvent, LoadingLevel, LoadingProgress};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub core_node_limit: usize,
    pub viewport_node_limit: usize,
    pub connected_node_limit: usize,
    pub batch_size: usize,
    pub frame_interval_ms: u64,
    pub min_zoom_for_details: f32,
    /// World units added on every side of the viewport before selecting nodes.
    pub viewport_margin: f32,
    pub weights: ImportanceWeights,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            core_node_limit: 150,
            viewport_node_limit: 600,
            connected_node_limit: 1200,
            batch_size: 40,
            frame_interval_ms: 16,
            min_zoom_for_details: 0.5,
            viewport_margin: 200.0,
            weights: ImportanceWeights::default(),
        }
    }
}

impl LoaderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderError {
    Destroyed,
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destroyed => f.write_str("loader used after destroy"),
        }
    }
}

impl std::error::Error for LoaderError {}

/// Nodes and links that became active in one activation step.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadBatch {
    pub nodes: Vec<NodeId>,
    /// Indices into [`GraphData::links`].
    pub links: Vec<usize>,
    pub progress: LoadingProgress,
}

pub struct ProgressiveLoader {
    config: LoaderConfig,
    graph: Option<Arc<GraphData>>,
    ranking: Vec<NodeId>,
    active: Vec<bool>,
    active_nodes: Vec<NodeId>,
    active_link_mask: Vec<bool>,
    active_links: Vec<usize>,
    queue: VecDeque<NodeId>,
    queued: Vec<bool>,
    level: LoadingLevel,
    since_drain: Duration,
    subscribers: Vec<Sender<LoaderEvent>>,
    destroyed: bool,
}

impl ProgressiveLoader {
    pub fn new(config: LoaderConfig) -> Self {
        let mut config = config;
        config.batch_size = config.batch_size.max(1);
        Self {
            config,
            graph: None,
            ranking: Vec::new(),
            active: Vec::new(),
            active_nodes: Vec::new(),
            active_link_mask: Vec::new(),
            active_links: Vec::new(),
            queue: VecDeque::new(),
            queued: Vec::new(),
            level: LoadingLevel::Core,
            since_drain: Duration::ZERO,
            subscribers: Vec::new(),
            destroyed: false,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn graph(&self) -> Option<&Arc<GraphData>> {
        self.graph.as_ref()
    }

    pub fn level(&self) -> LoadingLevel {
        self.level
    }

    pub fn ranking(&self) -> &[NodeId] {
        &self.ranking
    }

    pub fn active_nodes(&self) -> &[NodeId] {
        &self.active_nodes
    }

    pub fn active_links(&self) -> &[usize] {
        &self.active_links
    }

    pub fn active_count(&self) -> usize {
        self.active_nodes.len()
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        self.active.get(id.index()).copied().unwrap_or(false)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_loading(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn progress(&self) -> LoadingProgress {
        let total = self.graph.as_ref().map_or(0, |graph| graph.len());
        LoadingProgress::new(self.level, self.active_nodes.len(), total)
    }

    /// Channel receiving progress and nodes-changed notifications.
    pub fn subscribe(&mut self) -> Receiver<LoaderEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: LoaderEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn ensure_alive(&self) -> Result<(), LoaderError> {
        if self.destroyed {
            Err(LoaderError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Ranks the whole graph and activates the core nodes at once.
    pub fn initialize(&mut self, graph: Arc<GraphData>) -> Result<LoadBatch, LoaderError> {
        self.ensure_alive()?;
        self.clear_state();

        let count = graph.len();
        self.ranking = rank_nodes(&graph, self.config.weights);
        self.active = vec![false; count];
        self.queued = vec![false; count];
        self.active_link_mask = vec![false; graph.links().len()];
        self.level = LoadingLevel::Core;
        self.since_drain = self.config.frame_interval();

        let core = self
            .ranking
            .iter()
            .copied()
            .take(self.config.core_node_limit)
            .collect::<Vec<_>>();
        self.graph = Some(graph);
        let batch = self.activate(core);

        debug!(
            total = count,
            core = batch.nodes.len(),
            links = batch.links.len(),
            "loader initialized"
        );
        self.announce(&batch);
        Ok(batch)
    }

    fn clear_state(&mut self) {
        self.graph = None;
        self.ranking.clear();
        self.active.clear();
        self.active_nodes.clear();
        self.active_link_mask.clear();
        self.active_links.clear();
        self.queue.clear();
        self.queued.clear();
        self.level = LoadingLevel::Core;
        self.since_drain = Duration::ZERO;
    }

    fn activate(&mut self, nodes: Vec<NodeId>) -> LoadBatch {
        let Some(graph) = self.graph.clone() else {
            return LoadBatch {
                nodes: Vec::new(),
                links: Vec::new(),
                progress: self.progress(),
            };
        };

        let mut added = Vec::with_capacity(nodes.len());
        for id in nodes {
            let Some(slot) = self.active.get_mut(id.index()) else {
                continue;
            };
            if *slot {
                continue;
            }
            *slot = true;
            self.active_nodes.push(id);
            added.push(id);
        }

        let mut links = Vec::new();
        for &id in &added {
            for &link_index in graph.incident_links(id) {
                let link = graph.links()[link_index];
                if self.active_link_mask[link_index] || !self.is_active(link.other(id)) {
                    continue;
                }
                self.active_link_mask[link_index] = true;
                self.active_links.push(link_index);
                links.push(link_index);
            }
        }

        LoadBatch {
            nodes: added,
            links,
            progress: self.progress(),
        }
    }

    fn announce(&mut self, batch: &LoadBatch) {
        self.emit(LoaderEvent::Progress(batch.progress));
        self.emit(LoaderEvent::NodesChanged {
            added: batch.nodes.clone(),
            active_nodes: self.active_nodes.len(),
            active_links: self.active_links.len(),
        });
    }

    /// Drops the unprocessed tail of the queue; active nodes stay.
    fn cancel_pending(&mut self) {
        for id in self.queue.drain(..) {
            if let Some(flag) = self.queued.get_mut(id.index()) {
                *flag = false;
            }
        }
    }

    /// Common prologue of every trigger. `None` means the trigger is ignored.
    fn begin_trigger(&mut self, level: LoadingLevel) -> Result<Option<Arc<GraphData>>, LoaderError> {
        self.ensure_alive()?;
        let Some(graph) = self.graph.clone() else {
            return Ok(None);
        };
        if self.level == LoadingLevel::All {
            return Ok(None);
        }
        self.cancel_pending();
        self.level = level;
        Ok(Some(graph))
    }

    fn enqueue(&mut self, nodes: impl IntoIterator<Item = NodeId>, cap: Option<usize>) -> usize {
        let cap = cap.unwrap_or(usize::MAX);
        let mut count = 0;
        for id in nodes {
            if count >= cap {
                break;
            }
            let index = id.index();
            if index >= self.active.len() || self.active[index] || self.queued[index] {
                continue;
            }
            self.queued[index] = true;
            self.queue.push_back(id);
            count += 1;
        }
        count
    }

    fn room_below(&self, limit: usize) -> usize {
        limit.saturating_sub(self.active_nodes.len())
    }

    /// Queues inactive nodes whose seed position falls inside the padded
    /// bounds, then unpositioned nodes by importance, up to
    /// `viewport_node_limit`.
    pub fn load_viewport_nodes(&mut self, bounds: ViewportBounds) -> Result<usize, LoaderError> {
        let Some(graph) = self.begin_trigger(LoadingLevel::Viewport)? else {
            return Ok(0);
        };

        let area = bounds.expanded(self.config.viewport_margin);
        let mut inside = Vec::new();
        let mut filler = Vec::new();
        for &id in &self.ranking {
            if self.active[id.index()] {
                continue;
            }
            match graph.node(id).and_then(|node| node.seed_position) {
                Some(position) if area.contains(position) => inside.push(id),
                Some(_) => {}
                None => filler.push(id),
            }
        }

        let cap = self.room_below(self.config.viewport_node_limit);
        let queued = self.enqueue(inside.into_iter().chain(filler), Some(cap));
        debug!(queued, cap, "viewport load queued");
        self.emit(LoaderEvent::Progress(self.progress()));
        Ok(queued)
    }

    /// Breadth-first expansion over the full link set, `depth` hops out.
    /// An unknown source queues nothing.
    pub fn load_connected_nodes(&mut self, source: NodeId, depth: usize) -> Result<usize, LoaderError> {
        let Some(graph) = self.begin_trigger(LoadingLevel::Connected)? else {
            return Ok(0);
        };
        if graph.node(source).is_none() {
            return Ok(0);
        }

        let mut visited = vec![false; graph.len()];
        let mut discovered = Vec::new();
        let mut frontier = VecDeque::new();
        visited[source.index()] = true;
        frontier.push_back((source, 0usize));
        while let Some((current, hops)) = frontier.pop_front() {
            discovered.push(current);
            if hops >= depth {
                continue;
            }
            for next in graph.neighbors(current) {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    frontier.push_back((next, hops + 1));
                }
            }
        }

        let cap = self.room_below(self.config.connected_node_limit);
        let queued = self.enqueue(discovered, Some(cap));
        debug!(source = %source, depth, queued, cap, "connected load queued");
        self.emit(LoaderEvent::Progress(self.progress()));
        Ok(queued)
    }

    pub fn load_connected_by_key(&mut self, key: &str, depth: usize) -> Result<usize, LoaderError> {
        self.ensure_alive()?;
        match self.graph.as_ref().and_then(|graph| graph.id_of(key)) {
            Some(source) => self.load_connected_nodes(source, depth),
            None => {
                // still cancels whatever was draining
                let _ = self.begin_trigger(LoadingLevel::Connected)?;
                Ok(0)
            }
        }
    }

    /// Queues every remaining node, uncapped.
    pub fn load_all_nodes(&mut self) -> Result<usize, LoaderError> {
        let Some(_graph) = self.begin_trigger(LoadingLevel::All)? else {
            return Ok(0);
        };
        let ranking = std::mem::take(&mut self.ranking);
        let queued = self.enqueue(ranking.iter().copied(), None);
        self.ranking = ranking;
        debug!(queued, "full load queued");
        self.emit(LoaderEvent::Progress(self.progress()));
        Ok(queued)
    }

    /// Viewport load guarded by the detail zoom threshold.
    pub fn update_viewport(&mut self, bounds: ViewportBounds) -> Result<usize, LoaderError> {
        self.ensure_alive()?;
        if bounds.zoom < self.config.min_zoom_for_details {
            return Ok(0);
        }
        self.load_viewport_nodes(bounds)
    }

    /// Scheduler step. Drains at most one batch once `frame_interval` has
    /// elapsed since the previous one.
    pub fn tick(&mut self, elapsed: Duration) -> Option<LoadBatch> {
        if self.destroyed || self.graph.is_none() {
            return None;
        }

        let interval = self.config.frame_interval();
        self.since_drain = self.since_drain.saturating_add(elapsed);
        if self.queue.is_empty() || self.since_drain < interval {
            return None;
        }
        self.since_drain = Duration::ZERO;

        let take = self.config.batch_size.min(self.queue.len());
        let mut nodes = Vec::with_capacity(take);
        for id in self.queue.drain(..take) {
            if let Some(flag) = self.queued.get_mut(id.index()) {
                *flag = false;
            }
            nodes.push(id);
        }

        let batch = self.activate(nodes);
        trace!(
            added = batch.nodes.len(),
            pending = self.queue.len(),
            loaded = batch.progress.loaded,
            "load batch drained"
        );
        self.announce(&batch);
        Some(batch)
    }

    /// Back to the uninitialized state; subscribers stay connected.
    pub fn reset(&mut self) {
        self.clear_state();
        self.emit(LoaderEvent::Progress(self.progress()));
    }

    pub fn destroy(&mut self) {
        self.clear_state();
        self.subscribers.clear();
        self.destroyed = true;
    }
}
