use eframe::egui::Vec2;

use crate::util::fallback_direction;

use super::quadtree::QuadNode;

const MIN_DISTANCE_SQ: f32 = 1.0;
const COINCIDENT_EPSILON_SQ: f32 = 1e-6;

/// Direction from `b` towards `a` when the two bodies sit on top of each other.
/// Antisymmetric so a coincident pair is pushed apart instead of together.
fn separation_direction(a: usize, b: usize) -> Vec2 {
    if a < b {
        fallback_direction(a, b)
    } else {
        -fallback_direction(b, a)
    }
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Charge strength already scaled by alpha; negative repels.
    pub(super) weight: f32,
    pub(super) max_distance_sq: f32,
    pub(super) theta: f32,
}

fn charge_between(
    index: usize,
    other: usize,
    point: Vec2,
    source: Vec2,
    weight: f32,
    max_distance_sq: f32,
) -> Vec2 {
    let mut delta = source - point;
    let mut distance_sq = delta.length_sq();
    if distance_sq > max_distance_sq {
        return Vec2::ZERO;
    }
    if distance_sq < COINCIDENT_EPSILON_SQ {
        delta = -separation_direction(index, other);
        distance_sq = 1.0;
    }
    delta * (weight / distance_sq.max(MIN_DISTANCE_SQ))
}

pub(super) fn accumulate_charge_for_body(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            *velocity += charge_between(
                index,
                other,
                point,
                positions[other],
                params.weight,
                params.max_distance_sq,
            );
        }
        return;
    }

    let delta = node.center_of_mass - point;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < params.theta)
        && node.mass > 1.0;

    if can_approximate {
        if distance_sq <= params.max_distance_sq {
            *velocity += delta * ((params.weight * node.mass) / distance_sq.max(MIN_DISTANCE_SQ));
        }
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge_for_body(child, index, positions, params, velocity);
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
}

fn resolve_collision(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    velocities: &mut [Vec2],
) {
    let min_distance = radii[from] + radii[to];
    let mut delta = positions[to] - positions[from];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= min_distance * min_distance {
        return;
    }
    if distance_sq < COINCIDENT_EPSILON_SQ {
        delta = -separation_direction(from, to) * 0.01;
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = ((min_distance - distance) / distance) * params.strength;
    let correction = delta * push;
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let total = (from_sq + to_sq).max(f32::EPSILON);

    velocities[from] -= correction * (to_sq / total);
    velocities[to] += correction * (from_sq / total);
}

/// Dual-tree traversal over overlapping cells; only pairs whose cells are
/// within the sum of their largest radii are resolved.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    velocities: &mut [Vec2],
) {
    let reach = node_a.max_radius + node_b.max_radius;
    if node_a.bounds.distance_sq_to(node_b.bounds) > reach * reach {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for i in 0..node_a.indices.len() {
                for j in (i + 1)..node_a.indices.len() {
                    resolve_collision(
                        node_a.indices[i],
                        node_a.indices[j],
                        positions,
                        radii,
                        params,
                        velocities,
                    );
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_collision(from, to, positions, radii, params, velocities);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, velocities);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, velocities,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, velocities);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, velocities);
        }
    }
}

/// Spring between two bodies, resolved against the predicted positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringLink {
    pub source: usize,
    pub target: usize,
    pub distance: f32,
    pub strength: f32,
    /// Share of the correction applied to the target; the lighter-connected
    /// endpoint moves more.
    pub bias: f32,
}

pub(super) fn apply_springs(
    links: &[SpringLink],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        let mut delta = (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        let mut distance = delta.length();
        if distance * distance < COINCIDENT_EPSILON_SQ {
            delta = -separation_direction(source, target) * 0.01;
            distance = 0.01;
        }

        let stretch = ((distance - link.distance) / distance) * alpha * link.strength;
        let correction = delta * stretch;
        velocities[target] -= correction * link.bias;
        velocities[source] += correction * (1.0 - link.bias);
    }
}

/// Moves free bodies so the centroid of all bodies drifts toward `center`.
pub(super) fn apply_center(
    positions: &mut [Vec2],
    pinned: &[bool],
    center: Vec2,
    strength: f32,
) {
    if positions.is_empty() || strength <= 0.0 {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for position in positions.iter() {
        centroid += *position;
    }
    centroid /= positions.len() as f32;

    let shift = (centroid - center) * strength;
    if shift.length_sq() <= 1e-12 {
        return;
    }
    for (position, &is_pinned) in positions.iter_mut().zip(pinned) {
        if !is_pinned {
            *position -= shift;
        }
    }
}
