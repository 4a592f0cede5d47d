//! Pan/zoom transform between world space and the drawing surface.
//!
//! `screen = world * scale + translate`, screen coordinates in logical points
//! with the origin at the surface's top-left corner.

mod visibility;

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::physics::Simulation;
use crate::util::is_finite_vec;

pub use visibility::{circle_visible, segment_visible};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 20.0,
        }
    }
}

/// World-space rectangle currently on screen, plus the zoom it is seen at.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
}

impl ViewportBounds {
    pub fn world_rect(&self) -> Rect {
        Rect::from_min_size(pos2(self.x, self.y), vec2(self.width, self.height))
    }

    pub fn expanded(&self, margin: f32) -> Self {
        let margin = margin.max(0.0);
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
            zoom: self.zoom,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl ViewTransform {
    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        (world * self.scale + self.translate).to_pos2()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.translate) / self.scale
    }
}

pub struct ViewportController {
    config: ViewportConfig,
    transform: ViewTransform,
    surface: Vec2,
    pixels_per_point: f32,
}

impl ViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        let min_zoom = if config.min_zoom.is_finite() && config.min_zoom > 0.0 {
            config.min_zoom
        } else {
            ViewportConfig::default().min_zoom
        };
        let max_zoom = if config.max_zoom.is_finite() {
            config.max_zoom.max(min_zoom)
        } else {
            ViewportConfig::default().max_zoom.max(min_zoom)
        };
        let config = ViewportConfig { min_zoom, max_zoom };
        Self {
            config,
            transform: ViewTransform {
                translate: Vec2::ZERO,
                scale: 1.0_f32.clamp(min_zoom, max_zoom),
            },
            surface: Vec2::ZERO,
            pixels_per_point: 1.0,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    pub fn surface_size(&self) -> Vec2 {
        self.surface
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    pub fn surface_rect(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, self.surface)
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(self.config.min_zoom, self.config.max_zoom)
        } else {
            self.transform.scale
        }
    }

    /// Non-finite components are ignored.
    pub fn set_transform(&mut self, tx: f32, ty: f32, scale: f32) {
        let translate = vec2(tx, ty);
        if is_finite_vec(translate) {
            self.transform.translate = translate;
        }
        self.transform.scale = self.clamp_scale(scale);
    }

    /// Surface size in physical pixels; stored in logical points.
    pub fn set_surface(&mut self, width: f32, height: f32, pixels_per_point: f32) {
        let ppp = if pixels_per_point.is_finite() && pixels_per_point > 0.0 {
            pixels_per_point
        } else {
            1.0
        };
        self.pixels_per_point = ppp;
        self.surface = vec2(width / ppp, height / ppp).max(Vec2::ZERO);
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        self.transform.screen_to_world(screen)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        self.transform.world_to_screen(world)
    }

    pub fn current_bounds(&self) -> ViewportBounds {
        let origin = self.screen_to_world(Pos2::ZERO);
        let size = self.surface / self.transform.scale;
        ViewportBounds {
            x: origin.x,
            y: origin.y,
            width: size.x,
            height: size.y,
            zoom: self.transform.scale,
        }
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if is_finite_vec(delta) {
            self.transform.translate += delta;
        }
    }

    /// Scales by `factor` around `anchor` so the world point under it stays put.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 || !is_finite_vec(anchor.to_vec2()) {
            return;
        }
        let world = self.screen_to_world(anchor);
        self.transform.scale = self.clamp_scale(self.transform.scale * factor);
        self.transform.translate = anchor.to_vec2() - world * self.transform.scale;
    }

    /// Centers `world` on the surface at the largest zoom that fits it inside
    /// `padding` points of margin. A zero-area rectangle only recenters.
    pub fn fit_to_view(&mut self, world: Rect, padding: f32) -> bool {
        if !world.is_finite() || self.surface.x <= 0.0 || self.surface.y <= 0.0 {
            return false;
        }
        let padding = padding.max(0.0);
        let available = (self.surface - Vec2::splat(padding * 2.0)).max(Vec2::splat(1.0));

        if world.width() > f32::EPSILON && world.height() > f32::EPSILON {
            let scale = (available.x / world.width()).min(available.y / world.height());
            self.transform.scale = self.clamp_scale(scale);
        } else if world.width() > f32::EPSILON {
            self.transform.scale = self.clamp_scale(available.x / world.width());
        } else if world.height() > f32::EPSILON {
            self.transform.scale = self.clamp_scale(available.y / world.height());
        }

        self.transform.translate = self.surface * 0.5 - world.center().to_vec2() * self.transform.scale;
        true
    }

    pub fn find_node(&self, sim: &Simulation, world_x: f32, world_y: f32, extra_radius: f32) -> Option<NodeId> {
        sim.find_nearest(world_x, world_y, extra_radius)
    }

    /// Hit test at a screen point; `slop` is in logical points.
    pub fn node_at_screen(&self, sim: &Simulation, screen: Pos2, slop: f32) -> Option<NodeId> {
        let world = self.screen_to_world(screen);
        self.find_node(sim, world.x, world.y, slop / self.transform.scale)
    }

    pub fn circle_on_screen(&self, world: Vec2, radius: f32) -> bool {
        circle_visible(
            self.surface_rect(),
            self.world_to_screen(world),
            radius * self.transform.scale,
        )
    }

    pub fn segment_on_screen(&self, start: Vec2, end: Vec2, padding: f32) -> bool {
        segment_visible(
            self.surface_rect(),
            self.world_to_screen(start),
            self.world_to_screen(end),
            padding,
        )
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodySpec, SimulationConfig};

    fn controller() -> ViewportController {
        let mut viewport = ViewportController::default();
        viewport.set_surface(800.0, 600.0, 1.0);
        viewport
    }

    #[test]
    fn scale_is_clamped_to_zoom_range() {
        let mut viewport = controller();
        viewport.set_transform(0.0, 0.0, 100.0);
        assert_eq!(viewport.scale(), 20.0);
        viewport.set_transform(0.0, 0.0, 0.0001);
        assert_eq!(viewport.scale(), 0.1);
        viewport.set_transform(f32::NAN, 3.0, f32::NAN);
        assert_eq!(viewport.scale(), 0.1);
        assert_eq!(viewport.transform().translate, Vec2::ZERO);
    }

    #[test]
    fn current_bounds_follow_translate_and_zoom() {
        let mut viewport = controller();
        viewport.set_transform(400.0, 300.0, 2.0);
        let bounds = viewport.current_bounds();
        assert_eq!(bounds.x, -200.0);
        assert_eq!(bounds.y, -150.0);
        assert_eq!(bounds.width, 400.0);
        assert_eq!(bounds.height, 300.0);
        assert_eq!(bounds.zoom, 2.0);
        assert!(bounds.contains(Vec2::ZERO));
    }

    #[test]
    fn physical_surface_is_converted_to_points() {
        let mut viewport = ViewportController::default();
        viewport.set_surface(1600.0, 1200.0, 2.0);
        assert_eq!(viewport.surface_size(), vec2(800.0, 600.0));
    }

    #[test]
    fn zoom_keeps_the_anchor_fixed() {
        let mut viewport = controller();
        viewport.set_transform(120.0, -40.0, 1.5);
        let anchor = pos2(310.0, 205.0);
        let before = viewport.screen_to_world(anchor);
        viewport.zoom_at(anchor, 1.7);
        let after = viewport.screen_to_world(anchor);
        assert!((before - after).length() < 1e-3);
        assert!((viewport.scale() - 2.55).abs() < 1e-4);
    }

    #[test]
    fn fit_to_view_frames_the_rectangle() {
        let mut viewport = controller();
        let world = Rect::from_min_max(pos2(-100.0, -50.0), pos2(300.0, 150.0));
        assert!(viewport.fit_to_view(world, 0.0));
        assert_eq!(viewport.scale(), 2.0);
        let center = viewport.world_to_screen(vec2(100.0, 50.0));
        assert!((center - pos2(400.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn fit_to_view_on_a_point_recenters_without_zoom_change() {
        let mut viewport = controller();
        viewport.set_transform(0.0, 0.0, 3.0);
        let point = Rect::from_min_max(pos2(10.0, 10.0), pos2(10.0, 10.0));
        assert!(viewport.fit_to_view(point, 20.0));
        assert_eq!(viewport.scale(), 3.0);
        assert_eq!(viewport.world_to_screen(vec2(10.0, 10.0)), pos2(400.0, 300.0));

        let mut empty = ViewportController::default();
        assert!(!empty.fit_to_view(point, 0.0));
    }

    #[test]
    fn screen_hit_test_converts_slop_to_world_units() {
        let mut sim = Simulation::new(SimulationConfig::default());
        sim.initialize(
            vec![BodySpec {
                id: NodeId(7),
                depth: 0,
                radius: 5.0,
                position: Some(vec2(100.0, 0.0)),
            }],
            &[],
            false,
        )
        .unwrap();
        let mut viewport = controller();
        viewport.set_transform(0.0, 0.0, 2.0);
        assert_eq!(viewport.find_node(&sim, 100.0, 0.0, 0.0), Some(NodeId(7)));
        // 18 points away on screen is 9 world units: outside the radius
        assert_eq!(viewport.node_at_screen(&sim, pos2(218.0, 0.0), 0.0), None);
        assert_eq!(viewport.node_at_screen(&sim, pos2(218.0, 0.0), 10.0), Some(NodeId(7)));
    }

    #[test]
    fn culling_accounts_for_zoomed_radius() {
        let mut viewport = controller();
        viewport.set_transform(0.0, 0.0, 4.0);
        assert!(viewport.circle_on_screen(vec2(-0.5, 10.0), 1.0));
        assert!(!viewport.circle_on_screen(vec2(-3.0, 10.0), 0.5));
        assert!(viewport.segment_on_screen(vec2(-10.0, 10.0), vec2(500.0, 10.0), 0.0));
    }
}
