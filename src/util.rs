use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};

pub(crate) const GOLDEN_RATIO_FRACTION: f32 = 0.618_034;

/// Deterministic pseudo-random pair in `[-1, 1]` derived from a key.
pub(crate) fn stable_pair(key: impl Hash) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Unit direction used when two points coincide; stable for a given pair.
pub(crate) fn fallback_direction(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * GOLDEN_RATIO_FRACTION + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub(crate) fn normalize_log(value: f32, min: f32, max: f32) -> f32 {
    let min = min.max(1.0) as f64;
    let max = (max as f64).max(min);
    let value = (value as f64).max(1.0);

    if (max - min).abs() < f64::EPSILON {
        return 0.5;
    }

    let denominator = max.ln() - min.ln();
    if denominator.abs() < f64::EPSILON {
        return 0.5;
    }

    ((value.ln() - min.ln()) / denominator).clamp(0.0, 1.0) as f32
}

pub(crate) fn is_finite_vec(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_repeatable_and_bounded() {
        let first = stable_pair("category/shoes");
        let second = stable_pair("category/shoes");
        assert_eq!(first, second);
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }

    #[test]
    fn normalize_log_handles_flat_range() {
        assert_eq!(normalize_log(10.0, 10.0, 10.0), 0.5);
        assert_eq!(normalize_log(1.0, 1.0, 1000.0), 0.0);
        assert_eq!(normalize_log(1000.0, 1.0, 1000.0), 1.0);
    }
}
