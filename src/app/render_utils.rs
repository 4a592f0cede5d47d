use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};
use taxograph::graph::NodeStatus;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Grid anchored at the screen position of the world origin.
pub(super) fn draw_background(painter: &Painter, rect: Rect, origin: Pos2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn node_color(status: NodeStatus, depth: u32) -> Color32 {
    match status {
        NodeStatus::Optimal => Color32::from_rgb(92, 190, 120),
        NodeStatus::NeedsWork => Color32::from_rgb(232, 162, 76),
        NodeStatus::Unknown => {
            let t = (depth as f32 / 4.0).clamp(0.0, 1.0);
            let r = (55.0 + (60.0 * t)) as u8;
            let g = (150.0 - (30.0 * t)) as u8;
            let b = (215.0 - (45.0 * t)) as u8;
            Color32::from_rgb(r, g, b)
        }
    }
}
