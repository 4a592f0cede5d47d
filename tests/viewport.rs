//! Screen/world mapping and hit testing.

use eframe::egui::{Rect, pos2, vec2};
use proptest::prelude::*;
use taxograph::NodeId;
use taxograph::physics::{BodySpec, Simulation, SimulationConfig};
use taxograph::viewport::{ViewportConfig, ViewportController, segment_visible};

fn controller(tx: f32, ty: f32, scale: f32) -> ViewportController {
    let mut viewport = ViewportController::new(ViewportConfig::default());
    viewport.set_surface(1280.0, 720.0, 1.0);
    viewport.set_transform(tx, ty, scale);
    viewport
}

fn grid_simulation(jitter: &[(f32, f32, f32)]) -> Simulation {
    let nodes = jitter
        .iter()
        .enumerate()
        .map(|(index, &(dx, dy, radius))| BodySpec {
            id: NodeId(index as u32),
            depth: 2,
            radius,
            position: Some(vec2(
                (index % 8) as f32 * 100.0 + dx,
                (index / 8) as f32 * 100.0 + dy,
            )),
        })
        .collect();
    let mut sim = Simulation::new(SimulationConfig::default());
    sim.initialize(nodes, &[], false).expect("fresh simulation");
    sim
}

proptest! {
    #[test]
    fn screen_and_world_mappings_invert_each_other(
        tx in -10_000.0f32..10_000.0,
        ty in -10_000.0f32..10_000.0,
        scale in 0.1f32..20.0,
        x in -10_000.0f32..10_000.0,
        y in -10_000.0f32..10_000.0,
    ) {
        let viewport = controller(tx, ty, scale);
        let world = vec2(x, y);
        let back = viewport.screen_to_world(viewport.world_to_screen(world));
        let tolerance = 1e-5 * (1.0 + world.length() + vec2(tx, ty).length() / scale);
        prop_assert!((back - world).length() <= tolerance, "{world:?} came back as {back:?}");
    }

    #[test]
    fn clicking_a_node_centre_finds_that_node(
        jitter in prop::collection::vec((-20.0f32..20.0, -20.0f32..20.0, 2.0f32..30.0), 1..40),
        pick in any::<prop::sample::Index>(),
        tx in -400.0f32..400.0,
        ty in -400.0f32..400.0,
        scale in 0.1f32..20.0,
    ) {
        let sim = grid_simulation(&jitter);
        let viewport = controller(tx, ty, scale);
        let target = NodeId(pick.index(jitter.len()) as u32);
        let center = sim.position(target).unwrap();

        let screen = viewport.world_to_screen(center);
        prop_assert_eq!(viewport.node_at_screen(&sim, screen, 0.0), Some(target));

        let world = viewport.screen_to_world(screen);
        prop_assert_eq!(viewport.find_node(&sim, world.x, world.y, 0.0), Some(target));
        prop_assert_eq!(viewport.find_node(&sim, -5_000.0, -5_000.0, 50.0), None);
    }
}

#[test]
fn misses_just_outside_radius_plus_slop() {
    let sim = grid_simulation(&[(0.0, 0.0, 10.0)]);
    let viewport = controller(0.0, 0.0, 1.0);
    assert_eq!(viewport.find_node(&sim, 14.0, 0.0, 5.0), Some(NodeId(0)));
    assert_eq!(viewport.find_node(&sim, 15.5, 0.0, 5.0), None);
}

#[test]
fn bounds_shrink_as_zoom_grows() {
    let mut viewport = controller(0.0, 0.0, 1.0);
    let wide = viewport.current_bounds();
    viewport.zoom_at(pos2(640.0, 360.0), 4.0);
    let narrow = viewport.current_bounds();
    assert!((narrow.width - wide.width / 4.0).abs() < 1e-3);
    assert!(wide.world_rect().contains_rect(narrow.world_rect()));
}

#[test]
fn zoom_requests_outside_the_range_are_clamped() {
    let mut viewport = controller(0.0, 0.0, 1.0);
    for _ in 0..100 {
        viewport.zoom_at(pos2(10.0, 10.0), 1.5);
    }
    assert_eq!(viewport.scale(), 20.0);
    for _ in 0..100 {
        viewport.zoom_at(pos2(10.0, 10.0), 0.5);
    }
    assert_eq!(viewport.scale(), 0.1);
}

#[test]
fn long_links_across_the_surface_are_kept() {
    let surface = Rect::from_min_max(pos2(0.0, 0.0), pos2(1280.0, 720.0));
    assert!(segment_visible(surface, pos2(-900.0, 360.0), pos2(2200.0, 360.0), 0.0));
    assert!(!segment_visible(surface, pos2(-900.0, -10.0), pos2(2200.0, -10.0), 0.0));
}
