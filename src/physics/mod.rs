//! Force-directed layout for the active node set.
//!
//! The solver integrates velocities the way a classic force layout does: every
//! tick applies link springs, Barnes-Hut approximated charge, collision and
//! centering, damps velocities, advances positions and cools `alpha`. Bodies
//! live in a dense arena addressed by slot; callers address them by
//! [`NodeId`].

mod config;
mod forces;
mod placement;
mod quadtree;

use std::collections::{HashMap, HashSet};
use std::fmt;

use eframe::egui::{Rect, Vec2, pos2, vec2};
use tracing::{debug, trace};

use crate::graph::NodeId;
use crate::spatial::SpatialIndex;
use crate::util::is_finite_vec;

pub use config::{
    CenterForceConfig, ChargeForceConfig, CollisionForceConfig, DecayConfig, LinkForceConfig,
    SimulationConfig, SimulationConfigPatch,
};
pub use forces::SpringLink;
use forces::{
    ChargeParams, CollisionParams, accumulate_charge_for_body, accumulate_collision_pairs,
    apply_center, apply_springs,
};
use quadtree::QuadNode;

/// Above this many bodies `find_nearest` goes through the spatial index.
pub const LINEAR_SCAN_LIMIT: usize = 256;
/// Ticks run by `add_nodes` so new bodies never render unplaced.
pub const SETTLE_TICKS: usize = 3;
/// Alpha used when the layout is restarted by a config change or new nodes.
pub const REHEAT_ALPHA: f32 = 0.3;
/// Alpha floor and target held while a body is dragged.
pub const DRAG_ALPHA: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationError {
    NotInitialized,
    Destroyed,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => f.write_str("simulation used before initialize"),
            Self::Destroyed => f.write_str("simulation used after destroy"),
        }
    }
}

impl std::error::Error for SimulationError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Ready,
    Destroyed,
}

/// Node as handed to the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySpec {
    pub id: NodeId,
    pub depth: u32,
    pub radius: f32,
    pub position: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkSpec {
    pub source: NodeId,
    pub target: NodeId,
    pub strength: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub id: NodeId,
    pub depth: u32,
    pub radius: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
    pinned: Vec<bool>,
}

pub struct Simulation {
    lifecycle: Lifecycle,
    config: SimulationConfig,
    bodies: Vec<Body>,
    slot_by_id: HashMap<NodeId, usize>,
    links: Vec<LinkSpec>,
    link_keys: HashSet<(NodeId, NodeId)>,
    springs: Vec<SpringLink>,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    dragging: HashSet<NodeId>,
    spatial: SpatialIndex,
    scratch: Scratch,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            config: config.sanitized(),
            bodies: Vec::new(),
            slot_by_id: HashMap::new(),
            links: Vec::new(),
            link_keys: HashSet::new(),
            springs: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            running: false,
            dragging: HashSet::new(),
            spatial: SpatialIndex::default(),
            scratch: Scratch::default(),
        }
    }

    fn ensure_ready(&self) -> Result<(), SimulationError> {
        match self.lifecycle {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Uninitialized => Err(SimulationError::NotInitialized),
            Lifecycle::Destroyed => Err(SimulationError::Destroyed),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_at_rest(&self) -> bool {
        self.alpha < self.config.decay.alpha_min
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Active links, deduplicated, in insertion order.
    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    pub fn springs(&self) -> &[SpringLink] {
        &self.springs
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot_by_id.contains_key(&id)
    }

    pub fn body(&self, id: NodeId) -> Option<&Body> {
        self.slot_by_id.get(&id).map(|&slot| &self.bodies[slot])
    }

    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        self.body(id).map(|body| body.position)
    }

    /// World rectangle covering every body including its radius.
    pub fn extent(&self) -> Option<Rect> {
        let first = self.bodies.first()?;
        let mut min = first.position;
        let mut max = first.position;
        for body in &self.bodies {
            min = min.min(body.position - Vec2::splat(body.radius));
            max = max.max(body.position + Vec2::splat(body.radius));
        }
        Some(Rect::from_min_max(pos2(min.x, min.y), pos2(max.x, max.y)))
    }

    /// Replaces the whole active set. Alpha restarts at 1.
    pub fn initialize(
        &mut self,
        nodes: Vec<BodySpec>,
        links: &[LinkSpec],
        auto_run: bool,
    ) -> Result<(), SimulationError> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Err(SimulationError::Destroyed);
        }

        self.bodies.clear();
        self.slot_by_id.clear();
        self.links.clear();
        self.link_keys.clear();
        self.dragging.clear();
        self.lifecycle = Lifecycle::Ready;

        let added = self.append_bodies(nodes);
        self.append_links(links);
        self.place_unpositioned(&added, true);
        self.rebuild_springs();

        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.running = auto_run;
        self.rebuild_spatial_index();

        debug!(
            bodies = self.bodies.len(),
            springs = self.springs.len(),
            auto_run,
            "simulation initialized"
        );
        Ok(())
    }

    fn append_bodies(&mut self, nodes: Vec<BodySpec>) -> Vec<(usize, bool)> {
        let mut added = Vec::with_capacity(nodes.len());
        for spec in nodes {
            if self.slot_by_id.contains_key(&spec.id) {
                continue;
            }
            let slot = self.bodies.len();
            let position = spec.position.filter(|position| is_finite_vec(*position));
            self.bodies.push(Body {
                id: spec.id,
                depth: spec.depth,
                radius: if spec.radius.is_finite() && spec.radius > 0.0 { spec.radius } else { 1.0 },
                position: position.unwrap_or(Vec2::ZERO),
                velocity: Vec2::ZERO,
                pinned: None,
            });
            self.slot_by_id.insert(spec.id, slot);
            added.push((slot, position.is_some()));
        }
        added
    }

    fn append_links(&mut self, links: &[LinkSpec]) {
        for link in links {
            if link.source == link.target
                || !self.slot_by_id.contains_key(&link.source)
                || !self.slot_by_id.contains_key(&link.target)
            {
                continue;
            }
            let key = (link.source.min(link.target), link.source.max(link.target));
            if self.link_keys.insert(key) {
                self.links.push(*link);
            }
        }
    }

    /// Unpositioned bodies go next to a placed neighbour; lacking one, onto
    /// the start spiral (`initialize`) or near the center (`add_nodes`).
    fn place_unpositioned(&mut self, added: &[(usize, bool)], spiral: bool) {
        let mut placed = vec![true; self.bodies.len()];
        for &(slot, has_position) in added {
            placed[slot] = has_position;
        }

        let mut neighbors: HashMap<usize, Vec<usize>> = HashMap::new();
        for link in &self.links {
            let source = self.slot_by_id[&link.source];
            let target = self.slot_by_id[&link.target];
            neighbors.entry(source).or_default().push(target);
            neighbors.entry(target).or_default().push(source);
        }

        let center = vec2(self.config.center.x, self.config.center.y);
        let mut spiral_index = 0;
        for &(slot, has_position) in added {
            if has_position {
                continue;
            }
            let anchor = neighbors
                .get(&slot)
                .and_then(|candidates| candidates.iter().copied().find(|&other| placed[other]));
            let position = match anchor {
                Some(anchor) => placement::next_to(&self.bodies[anchor], &self.bodies[slot]),
                None if spiral => {
                    let position = placement::spiral_position(center, spiral_index);
                    spiral_index += 1;
                    position
                }
                None => placement::near_center(center, &self.bodies[slot]),
            };
            self.bodies[slot].position = position;
            placed[slot] = true;
        }
    }

    fn collision_radius(&self, body: &Body) -> f32 {
        body.radius * self.config.collision.padding_for(body.depth)
    }

    fn rebuild_springs(&mut self) {
        let mut counts = vec![0usize; self.bodies.len()];
        let mut resolved = Vec::with_capacity(self.links.len());
        for link in &self.links {
            let source = self.slot_by_id[&link.source];
            let target = self.slot_by_id[&link.target];
            counts[source] += 1;
            counts[target] += 1;
            resolved.push((source, target, link.strength));
        }

        let link_config = self.config.link;
        let springs = resolved
            .into_iter()
            .map(|(source, target, strength)| {
                let source_body = &self.bodies[source];
                let target_body = &self.bodies[target];
                let padding = self.collision_radius(source_body) + self.collision_radius(target_body);
                let adjacent = source_body.depth.abs_diff(target_body.depth) == 1;
                let (distance, strength) = if adjacent {
                    (link_config.hierarchy_distance + padding, link_config.hierarchy_strength)
                } else {
                    (
                        link_config.base_distance + padding,
                        strength.unwrap_or(link_config.base_strength),
                    )
                };
                let bias = counts[source] as f32 / (counts[source] + counts[target]) as f32;
                SpringLink {
                    source,
                    target,
                    distance,
                    strength,
                    bias,
                }
            })
            .collect();
        self.springs = springs;
    }

    fn rebuild_spatial_index(&mut self) {
        self.spatial.rebuild(
            self.bodies
                .iter()
                .enumerate()
                .map(|(slot, body)| (slot, body.position, body.radius)),
        );
    }

    /// One integration tick. Returns `false` without touching anything once
    /// the simulation is at rest.
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        self.ensure_ready()?;
        if self.is_at_rest() {
            self.running = false;
            return Ok(false);
        }

        let decay = self.config.decay;
        self.alpha += (self.alpha_target - self.alpha) * decay.alpha_decay;
        let alpha = self.alpha;

        let count = self.bodies.len();
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        scratch.pinned.clear();
        for body in &self.bodies {
            scratch.positions.push(body.position);
            scratch.velocities.push(body.velocity);
            scratch
                .radii
                .push(body.radius * self.config.collision.padding_for(body.depth));
            scratch.pinned.push(body.pinned.is_some());
        }

        apply_springs(&self.springs, &scratch.positions, &mut scratch.velocities, alpha);

        if count > 1
            && let Some(tree) = QuadNode::build(&scratch.positions, &scratch.radii)
        {
            let charge = ChargeParams {
                weight: self.config.charge.strength * alpha,
                max_distance_sq: self.config.charge.max_distance * self.config.charge.max_distance,
                theta: self.config.charge.theta,
            };
            if charge.weight != 0.0 {
                for (index, velocity) in scratch.velocities.iter_mut().enumerate() {
                    accumulate_charge_for_body(&tree, index, &scratch.positions, charge, velocity);
                }
            }

            if self.config.collision.strength > 0.0 {
                accumulate_collision_pairs(
                    &tree,
                    &tree,
                    true,
                    &scratch.positions,
                    &scratch.radii,
                    CollisionParams {
                        strength: self.config.collision.strength,
                    },
                    &mut scratch.velocities,
                );
            }
        }

        let damping = 1.0 - decay.velocity_decay;
        for (index, body) in self.bodies.iter().enumerate() {
            if let Some(pin) = body.pinned {
                scratch.positions[index] = pin;
                scratch.velocities[index] = Vec2::ZERO;
                continue;
            }
            let velocity = scratch.velocities[index] * damping;
            let position = body.position + velocity;
            if is_finite_vec(velocity) && is_finite_vec(position) {
                scratch.velocities[index] = velocity;
                scratch.positions[index] = position;
            } else {
                scratch.velocities[index] = Vec2::ZERO;
                scratch.positions[index] = body.position;
            }
        }

        apply_center(
            &mut scratch.positions,
            &scratch.pinned,
            vec2(self.config.center.x, self.config.center.y),
            self.config.center.strength,
        );

        for (index, body) in self.bodies.iter_mut().enumerate() {
            body.position = scratch.positions[index];
            body.velocity = scratch.velocities[index];
        }
        self.rebuild_spatial_index();

        if self.is_at_rest() {
            self.running = false;
            trace!(alpha = self.alpha, "simulation reached rest");
        }
        Ok(true)
    }

    /// Per-frame entry point: steps only while the layout is running.
    pub fn tick(&mut self) -> Result<bool, SimulationError> {
        self.ensure_ready()?;
        if !self.running {
            return Ok(false);
        }
        self.step()
    }

    /// Steps until rest or `max_ticks`, then stops. Returns the ticks run.
    pub fn run_to_rest(&mut self, max_ticks: usize) -> Result<usize, SimulationError> {
        self.ensure_ready()?;
        let mut ticks = 0;
        while ticks < max_ticks && self.step()? {
            ticks += 1;
        }
        self.running = false;
        debug!(ticks, alpha = self.alpha, "static layout finished");
        Ok(ticks)
    }

    fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
        self.running = true;
    }

    pub fn drag_start(&mut self, id: NodeId) -> Result<bool, SimulationError> {
        self.ensure_ready()?;
        let Some(&slot) = self.slot_by_id.get(&id) else {
            return Ok(false);
        };
        let body = &mut self.bodies[slot];
        body.pinned = Some(body.position);
        body.velocity = Vec2::ZERO;
        self.dragging.insert(id);
        self.alpha_target = DRAG_ALPHA;
        self.reheat(DRAG_ALPHA);
        Ok(true)
    }

    pub fn drag(&mut self, id: NodeId, x: f32, y: f32) -> Result<bool, SimulationError> {
        self.ensure_ready()?;
        let target = vec2(x, y);
        if !is_finite_vec(target) {
            return Ok(false);
        }
        let Some(&slot) = self.slot_by_id.get(&id) else {
            return Ok(false);
        };
        let body = &mut self.bodies[slot];
        body.pinned = Some(target);
        body.position = target;
        body.velocity = Vec2::ZERO;
        let radius = body.radius;
        self.spatial.insert(slot, target, radius);
        Ok(true)
    }

    pub fn drag_end(&mut self, id: NodeId) -> Result<bool, SimulationError> {
        self.ensure_ready()?;
        let Some(&slot) = self.slot_by_id.get(&id) else {
            return Ok(false);
        };
        self.bodies[slot].pinned = None;
        self.dragging.remove(&id);
        if self.dragging.is_empty() {
            self.alpha_target = 0.0;
        }
        Ok(true)
    }

    /// Nearest body whose centre is within `body.radius + radius` of the point.
    /// Answers `None` rather than failing when the simulation is not ready.
    pub fn find_nearest(&self, x: f32, y: f32, radius: f32) -> Option<NodeId> {
        if self.lifecycle != Lifecycle::Ready {
            return None;
        }
        let point = vec2(x, y);
        let radius = radius.max(0.0);

        let slot = if self.bodies.len() > LINEAR_SCAN_LIMIT {
            self.spatial.nearest_within(point, radius).map(|(slot, _)| slot)
        } else {
            self.bodies
                .iter()
                .enumerate()
                .filter_map(|(slot, body)| {
                    let distance = (body.position - point).length();
                    (distance <= body.radius + radius).then_some((slot, distance))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
                .map(|(slot, _)| slot)
        };
        slot.map(|slot| self.bodies[slot].id)
    }

    /// Merges more bodies into the running layout and settles them briefly.
    /// Returns the ids that were actually added.
    pub fn add_nodes(
        &mut self,
        nodes: Vec<BodySpec>,
        links: &[LinkSpec],
    ) -> Result<Vec<NodeId>, SimulationError> {
        self.ensure_ready()?;
        let added = self.append_bodies(nodes);
        let link_count = self.links.len();
        self.append_links(links);
        if added.is_empty() && self.links.len() == link_count {
            return Ok(Vec::new());
        }

        self.place_unpositioned(&added, false);
        self.rebuild_springs();
        self.rebuild_spatial_index();
        self.reheat(REHEAT_ALPHA);
        for _ in 0..SETTLE_TICKS {
            self.step()?;
        }

        let ids = added
            .iter()
            .map(|&(slot, _)| self.bodies[slot].id)
            .collect::<Vec<_>>();
        debug!(added = ids.len(), bodies = self.bodies.len(), "bodies merged into layout");
        Ok(ids)
    }

    pub fn update_config(&mut self, patch: SimulationConfigPatch) -> Result<(), SimulationError> {
        self.ensure_ready()?;
        let mut config = self.config.clone();
        patch.apply_to(&mut config);
        self.config = config.sanitized();
        self.rebuild_springs();
        self.reheat(REHEAT_ALPHA);
        debug!(alpha = self.alpha, "simulation config updated");
        Ok(())
    }

    /// Releases every body and link. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.lifecycle = Lifecycle::Destroyed;
        self.bodies = Vec::new();
        self.slot_by_id = HashMap::new();
        self.links = Vec::new();
        self.link_keys = HashSet::new();
        self.springs = Vec::new();
        self.dragging.clear();
        self.spatial.clear();
        self.scratch = Scratch::default();
        self.alpha = 0.0;
        self.alpha_target = 0.0;
        self.running = false;
        debug!("simulation destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: u32, depth: u32) -> BodySpec {
        BodySpec {
            id: NodeId(id),
            depth,
            radius: 5.0,
            position: None,
        }
    }

    fn link(source: u32, target: u32) -> LinkSpec {
        LinkSpec {
            source: NodeId(source),
            target: NodeId(target),
            strength: None,
        }
    }

    #[test]
    fn operations_before_initialize_fail_fast() {
        let mut sim = Simulation::new(SimulationConfig::default());
        assert_eq!(sim.step(), Err(SimulationError::NotInitialized));
        assert_eq!(sim.drag_start(NodeId(0)), Err(SimulationError::NotInitialized));
        assert_eq!(sim.find_nearest(0.0, 0.0, 10.0), None);
    }

    #[test]
    fn destroy_is_idempotent_and_loud_afterwards() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(vec![spec(0, 0)], &[], true).unwrap();
        sim.destroy();
        sim.destroy();
        assert!(sim.is_empty());
        assert_eq!(sim.step(), Err(SimulationError::Destroyed));
        assert_eq!(
            sim.initialize(vec![spec(0, 0)], &[], true),
            Err(SimulationError::Destroyed)
        );
        assert_eq!(sim.find_nearest(0.0, 0.0, 100.0), None);
    }

    #[test]
    fn unknown_bodies_are_no_ops() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(vec![spec(0, 0)], &[], false).unwrap();
        assert_eq!(sim.drag_start(NodeId(42)), Ok(false));
        assert_eq!(sim.drag(NodeId(42), 1.0, 1.0), Ok(false));
        assert_eq!(sim.drag_end(NodeId(42)), Ok(false));
    }

    #[test]
    fn adjacent_depth_links_are_short_and_stiff() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(
            vec![spec(0, 0), spec(1, 1), spec(2, 1)],
            &[link(0, 1), link(1, 2)],
            false,
        )
        .unwrap();
        let springs = sim.springs();
        assert_eq!(springs.len(), 2);
        let hierarchy = springs[0];
        let sibling = springs[1];
        assert_eq!(hierarchy.strength, 0.8);
        assert!(hierarchy.distance < sibling.distance);
        assert_eq!(sibling.strength, LinkForceConfig::default().base_strength);
    }

    #[test]
    fn self_links_and_dangling_links_are_ignored() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(vec![spec(0, 0), spec(1, 1)], &[link(0, 0), link(0, 9), link(0, 1)], false)
            .unwrap();
        assert_eq!(sim.springs().len(), 1);
    }

    #[test]
    fn step_is_a_no_op_once_at_rest() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(vec![spec(0, 0), spec(1, 1)], &[link(0, 1)], false).unwrap();
        sim.run_to_rest(1_000).unwrap();
        assert!(sim.is_at_rest());
        let before = sim.bodies().to_vec();
        assert_eq!(sim.step(), Ok(false));
        assert_eq!(sim.bodies(), before.as_slice());
    }

    #[test]
    fn drag_start_reheats_a_cold_layout() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(vec![spec(0, 0), spec(1, 1)], &[link(0, 1)], false).unwrap();
        sim.run_to_rest(1_000).unwrap();
        assert!(sim.drag_start(NodeId(1)).unwrap());
        assert!(sim.alpha() >= DRAG_ALPHA);
        assert!(sim.is_running());
        sim.drag(NodeId(1), 250.0, 0.0).unwrap();
        assert_eq!(sim.find_nearest(250.0, 0.0, 0.0), Some(NodeId(1)));

        let start = sim.position(NodeId(0)).unwrap();
        for _ in 0..20 {
            sim.tick().unwrap();
        }
        assert_ne!(sim.position(NodeId(0)).unwrap(), start);
        assert_eq!(sim.position(NodeId(1)), Some(vec2(250.0, 0.0)));
        sim.drag_end(NodeId(1)).unwrap();
        assert!(sim.body(NodeId(1)).unwrap().pinned.is_none());
    }

    #[test]
    fn add_nodes_places_new_bodies_next_to_neighbors() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(vec![spec(0, 0)], &[], false).unwrap();
        sim.run_to_rest(300).unwrap();
        let anchor = sim.position(NodeId(0)).unwrap();

        let added = sim.add_nodes(vec![spec(1, 1), spec(0, 0)], &[link(0, 1)]).unwrap();
        assert_eq!(added, vec![NodeId(1)]);
        let placed = sim.position(NodeId(1)).unwrap();
        assert!(is_finite_vec(placed));
        assert!((placed - anchor).length() < 120.0);
        assert_eq!(sim.springs().len(), 1);
    }

    #[test]
    fn update_config_reheats_moderately() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(vec![spec(0, 0), spec(1, 1)], &[link(0, 1)], false).unwrap();
        sim.run_to_rest(1_000).unwrap();
        sim.update_config(SimulationConfigPatch {
            link_hierarchy_distance: Some(80.0),
            ..SimulationConfigPatch::default()
        })
        .unwrap();
        assert!((sim.alpha() - REHEAT_ALPHA).abs() < f32::EPSILON);
        assert_eq!(sim.config().link.hierarchy_distance, 80.0);
        assert!(sim.springs()[0].distance > 80.0);
    }

    #[test]
    fn coincident_bodies_never_produce_nan() {
        let mut sim = Simulation::new(SimulationConfig::default());
        let nodes = (0..30)
            .map(|id| BodySpec {
                position: Some(vec2(5.0, 5.0)),
                ..spec(id, 2)
            })
            .collect();
        sim.initialize(nodes, &[], true).unwrap();
        for _ in 0..50 {
            sim.step().unwrap();
        }
        assert!(sim.bodies().iter().all(|body| is_finite_vec(body.position)));
        let spread = sim.extent().unwrap();
        assert!(spread.width() > 20.0);
    }
}
