use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkForceConfig {
    /// Rest length for same-depth or depth-skipping links.
    pub base_distance: f32,
    pub base_strength: f32,
    /// Rest length between a parent and a direct child, before radii are added.
    pub hierarchy_distance: f32,
    pub hierarchy_strength: f32,
}

impl Default for LinkForceConfig {
    fn default() -> Self {
        Self {
            base_distance: 90.0,
            base_strength: 0.3,
            hierarchy_distance: 30.0,
            hierarchy_strength: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeForceConfig {
    /// Negative values repel.
    pub strength: f32,
    pub max_distance: f32,
    /// Barnes-Hut opening angle.
    pub theta: f32,
}

impl Default for ChargeForceConfig {
    fn default() -> Self {
        Self {
            strength: -30.0,
            max_distance: 600.0,
            theta: 0.9,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionForceConfig {
    /// Radius multiplier indexed by depth; the last entry applies to deeper nodes.
    pub padding_by_depth: Vec<f32>,
    pub strength: f32,
}

impl Default for CollisionForceConfig {
    fn default() -> Self {
        Self {
            padding_by_depth: vec![3.0, 2.0, 1.0],
            strength: 0.7,
        }
    }
}

impl CollisionForceConfig {
    pub fn padding_for(&self, depth: u32) -> f32 {
        let padding = match self.padding_by_depth.get(depth as usize) {
            Some(&padding) => padding,
            None => self.padding_by_depth.last().copied().unwrap_or(1.0),
        };
        if padding.is_finite() && padding > 0.0 { padding } else { 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterForceConfig {
    pub x: f32,
    pub y: f32,
    pub strength: f32,
}

impl Default for CenterForceConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            strength: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    pub alpha_decay: f32,
    /// Fraction of velocity removed every tick, in `(0, 1)`.
    pub velocity_decay: f32,
    pub alpha_min: f32,
}

impl Default for DecayConfig {
    fn default() -> Self {
        // (1 - 0.0235)^300 < 0.001: rest is reached within 300 ticks.
        Self {
            alpha_decay: 0.0235,
            velocity_decay: 0.4,
            alpha_min: 0.001,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub link: LinkForceConfig,
    pub charge: ChargeForceConfig,
    pub collision: CollisionForceConfig,
    pub center: CenterForceConfig,
    pub decay: DecayConfig,
}

impl SimulationConfig {
    pub(super) fn sanitized(mut self) -> Self {
        self.decay.alpha_decay = finite_or(self.decay.alpha_decay, 0.0235).clamp(0.0001, 0.9);
        self.decay.velocity_decay = finite_or(self.decay.velocity_decay, 0.4).clamp(0.01, 0.99);
        self.decay.alpha_min = finite_or(self.decay.alpha_min, 0.001).clamp(0.000_01, 0.5);
        self.charge.max_distance = finite_or(self.charge.max_distance, 600.0).max(1.0);
        self.charge.theta = finite_or(self.charge.theta, 0.9).clamp(0.0, 2.0);
        self.charge.strength = finite_or(self.charge.strength, -30.0);
        self.collision.strength = finite_or(self.collision.strength, 0.7).clamp(0.0, 1.0);
        self.center.strength = finite_or(self.center.strength, 0.1).clamp(0.0, 1.0);
        self.link.base_strength = finite_or(self.link.base_strength, 0.3).clamp(0.0, 1.0);
        self.link.hierarchy_strength = finite_or(self.link.hierarchy_strength, 0.8).clamp(0.0, 1.0);
        self.link.base_distance = finite_or(self.link.base_distance, 90.0).max(0.0);
        self.link.hierarchy_distance = finite_or(self.link.hierarchy_distance, 30.0).max(0.0);
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Partial override for [`SimulationConfig`]; absent fields keep their value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfigPatch {
    pub link_base_distance: Option<f32>,
    pub link_base_strength: Option<f32>,
    pub link_hierarchy_distance: Option<f32>,
    pub link_hierarchy_strength: Option<f32>,
    pub charge_strength: Option<f32>,
    pub charge_max_distance: Option<f32>,
    pub charge_theta: Option<f32>,
    pub collision_padding_by_depth: Option<Vec<f32>>,
    pub collision_strength: Option<f32>,
    pub center_x: Option<f32>,
    pub center_y: Option<f32>,
    pub center_strength: Option<f32>,
    pub alpha_decay: Option<f32>,
    pub velocity_decay: Option<f32>,
    pub alpha_min: Option<f32>,
}

impl SimulationConfigPatch {
    pub fn apply_to(self, config: &mut SimulationConfig) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut config.link.base_distance, self.link_base_distance);
        set(&mut config.link.base_strength, self.link_base_strength);
        set(&mut config.link.hierarchy_distance, self.link_hierarchy_distance);
        set(&mut config.link.hierarchy_strength, self.link_hierarchy_strength);
        set(&mut config.charge.strength, self.charge_strength);
        set(&mut config.charge.max_distance, self.charge_max_distance);
        set(&mut config.charge.theta, self.charge_theta);
        set(&mut config.collision.padding_by_depth, self.collision_padding_by_depth);
        set(&mut config.collision.strength, self.collision_strength);
        set(&mut config.center.x, self.center_x);
        set(&mut config.center.y, self.center_y);
        set(&mut config.center.strength, self.center_strength);
        set(&mut config.decay.alpha_decay, self.alpha_decay);
        set(&mut config.decay.velocity_decay, self.velocity_decay);
        set(&mut config.decay.alpha_min, self.alpha_min);
    }
}
