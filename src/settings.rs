//! Simulation tuning
//!
//! Loaded alongside the roster; every field falls back to its default.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// How ball-ball collisions exchange momentum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsVariant {
    /// Equal-mass elastic bounce only
    #[default]
    Classic,
    /// Elastic bounce plus a share of the speed differential handed to the slower ball
    SpeedTransfer,
}

impl PhysicsVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicsVariant::Classic => "Classic",
            PhysicsVariant::SpeedTransfer => "Speed Transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "classic" | "elastic" => Some(PhysicsVariant::Classic),
            "speedtransfer" | "transfer" => Some(PhysicsVariant::SpeedTransfer),
            _ => None,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Physics ===
    pub physics: PhysicsVariant,
    /// Largest dt handed to a single step
    pub max_frame_dt: f32,
    /// Seconds between contact hits for the same pair
    pub contact_cooldown: f32,
    /// Fraction of the speed differential moved by `SpeedTransfer`
    pub speed_transfer_fraction: f32,

    // === Weapons ===
    /// Seconds between melee hits from one attacker on one victim (0 = every frame)
    pub melee_hit_cooldown: f32,
    /// How far past the walls projectiles may fly before being dropped
    pub projectile_bounds_margin: f32,

    // === Battle flow ===
    pub loading_delay: f32,
    pub countdown_tick: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            physics: PhysicsVariant::Classic,
            max_frame_dt: MAX_FRAME_DT,
            contact_cooldown: CONTACT_COOLDOWN,
            speed_transfer_fraction: SPEED_TRANSFER_FRACTION,

            melee_hit_cooldown: 0.0,
            projectile_bounds_margin: PROJECTILE_BOUNDS_MARGIN,

            loading_delay: LOADING_DELAY,
            countdown_tick: COUNTDOWN_TICK,
        }
    }
}

impl Settings {
    /// Create settings for a physics variant
    pub fn with_physics(physics: PhysicsVariant) -> Self {
        Self {
            physics,
            ..Self::default()
        }
    }

    /// Whether collisions also transfer speed
    pub fn speed_transfer(&self) -> bool {
        self.physics == PhysicsVariant::SpeedTransfer
    }

    /// Replace nonsensical values with defaults and clamp the rest
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        fn fix(value: &mut f32, default: f32, min: f32, max: f32) {
            if !value.is_finite() {
                *value = default;
            }
            *value = value.clamp(min, max);
        }
        fix(&mut self.max_frame_dt, defaults.max_frame_dt, 0.001, 0.25);
        fix(&mut self.contact_cooldown, defaults.contact_cooldown, 0.0, 10.0);
        fix(&mut self.speed_transfer_fraction, defaults.speed_transfer_fraction, 0.0, 1.0);
        fix(&mut self.melee_hit_cooldown, defaults.melee_hit_cooldown, 0.0, 10.0);
        fix(&mut self.projectile_bounds_margin, defaults.projectile_bounds_margin, 0.0, 500.0);
        fix(&mut self.loading_delay, defaults.loading_delay, 0.0, 10.0);
        fix(&mut self.countdown_tick, defaults.countdown_tick, 0.0, 10.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_str() {
        assert_eq!(PhysicsVariant::from_str("classic"), Some(PhysicsVariant::Classic));
        assert_eq!(
            PhysicsVariant::from_str("Speed-Transfer"),
            Some(PhysicsVariant::SpeedTransfer)
        );
        assert_eq!(PhysicsVariant::from_str("bogus"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "physics": "speed_transfer" }"#).unwrap();
        assert!(settings.speed_transfer());
        assert_eq!(settings.contact_cooldown, CONTACT_COOLDOWN);
        assert_eq!(settings.max_frame_dt, MAX_FRAME_DT);
    }

    #[test]
    fn test_sanitize_clamps() {
        let mut settings = Settings {
            max_frame_dt: f32::NAN,
            speed_transfer_fraction: 3.0,
            contact_cooldown: -1.0,
            ..Settings::default()
        };
        settings.sanitize();
        assert_eq!(settings.max_frame_dt, MAX_FRAME_DT);
        assert_eq!(settings.speed_transfer_fraction, 1.0);
        assert_eq!(settings.contact_cooldown, 0.0);
    }
}
