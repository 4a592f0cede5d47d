use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};

use crate::util::{fallback_direction, stable_pair};

use super::Body;

const INITIAL_RADIUS: f32 = 10.0;
const NEIGHBOR_GAP: f32 = 20.0;
const CENTER_JITTER: f32 = 30.0;

fn jitter_direction(body: &Body) -> Vec2 {
    let (jx, jy) = stable_pair(body.id.0);
    let direction = vec2(jx, jy);
    if direction.length_sq() <= 0.0001 {
        fallback_direction(body.id.index(), 1)
    } else {
        direction.normalized()
    }
}

/// Phyllotaxis spiral slot `index` around `center`.
pub(super) fn spiral_position(center: Vec2, index: usize) -> Vec2 {
    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    center + vec2(angle.cos(), angle.sin()) * radius
}

pub(super) fn next_to(anchor: &Body, body: &Body) -> Vec2 {
    let (_, spread) = stable_pair(body.id.0);
    let distance = anchor.radius + body.radius + NEIGHBOR_GAP * (1.0 + spread.abs() * 0.5);
    anchor.position + jitter_direction(body) * distance
}

pub(super) fn near_center(center: Vec2, body: &Body) -> Vec2 {
    let (_, spread) = stable_pair(body.id.0);
    center + jitter_direction(body) * (CENTER_JITTER * (0.5 + spread.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn body(id: u32, position: Vec2) -> Body {
        Body {
            id: NodeId(id),
            depth: 1,
            radius: 5.0,
            position,
            velocity: Vec2::ZERO,
            pinned: None,
        }
    }

    #[test]
    fn spiral_slots_are_distinct() {
        let a = spiral_position(Vec2::ZERO, 0);
        let b = spiral_position(Vec2::ZERO, 1);
        let c = spiral_position(Vec2::ZERO, 2);
        assert!((a - b).length() > 1.0);
        assert!((b - c).length() > 1.0);
    }

    #[test]
    fn neighbor_placement_stays_close_to_anchor() {
        let anchor = body(0, vec2(400.0, -200.0));
        let placed = next_to(&anchor, &body(9, Vec2::ZERO));
        let distance = (placed - anchor.position).length();
        assert!(distance >= 30.0 && distance <= 41.0, "distance {distance}");
        assert_eq!(placed, next_to(&anchor, &body(9, Vec2::ZERO)));
    }
}
