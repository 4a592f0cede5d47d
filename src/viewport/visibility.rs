use eframe::egui::{Pos2, Rect};

/// Whether a circle in screen space overlaps `rect`.
pub fn circle_visible(rect: Rect, center: Pos2, radius: f32) -> bool {
    !(center.x + radius < rect.left()
        || center.x - radius > rect.right()
        || center.y + radius < rect.top()
        || center.y - radius > rect.bottom())
}

/// Whether a line segment, thickened by `padding`, crosses `rect`.
pub fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;
    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    let padded = rect.expand(padding);
    if padded.contains(start) || padded.contains(end) {
        return true;
    }

    let corners = [
        padded.left_top(),
        padded.right_top(),
        padded.right_bottom(),
        padded.left_bottom(),
    ];
    (0..4).any(|edge| segments_intersect(start, end, corners[edge], corners[(edge + 1) % 4]))
}

fn cross(origin: Pos2, a: Pos2, b: Pos2) -> f32 {
    let oa = a - origin;
    let ob = b - origin;
    (oa.x * ob.y) - (oa.y * ob.x)
}

fn straddles(c1: f32, c2: f32) -> bool {
    (c1 <= 0.0 && c2 >= 0.0) || (c1 >= 0.0 && c2 <= 0.0)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    if a1.x.max(a2.x) < b1.x.min(b2.x)
        || b1.x.max(b2.x) < a1.x.min(a2.x)
        || a1.y.max(a2.y) < b1.y.min(b2.y)
        || b1.y.max(b2.y) < a1.y.min(a2.y)
    {
        return false;
    }

    straddles(cross(a1, a2, b1), cross(a1, a2, b2)) && straddles(cross(b1, b2, a1), cross(b1, b2, a2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn screen() -> Rect {
        Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0))
    }

    #[test]
    fn circles_touching_the_edge_count_as_visible() {
        assert!(circle_visible(screen(), pos2(-4.0, 50.0), 5.0));
        assert!(!circle_visible(screen(), pos2(-6.0, 50.0), 5.0));
        assert!(circle_visible(screen(), pos2(50.0, 50.0), 0.0));
    }

    #[test]
    fn segment_crossing_the_surface_is_visible_without_visible_endpoints() {
        assert!(segment_visible(screen(), pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(segment_visible(screen(), pos2(-10.0, -10.0), pos2(110.0, 110.0), 0.0));
    }

    #[test]
    fn segment_passing_the_corner_is_culled() {
        assert!(!segment_visible(screen(), pos2(-50.0, 40.0), pos2(40.0, -50.0), 0.0));
        assert!(!segment_visible(screen(), pos2(120.0, 0.0), pos2(150.0, 90.0), 0.0));
        assert!(segment_visible(screen(), pos2(103.0, 0.0), pos2(103.0, 90.0), 4.0));
    }
}
