//! Damage, regeneration and defeat
//!
//! Every HP change goes through here so the pool always stays in `[0, max]`
//! and a ball is defeated exactly once.

use serde::{Deserialize, Serialize};

use super::state::{Ball, HealthModel};
use crate::consts::{MAX_SEGMENTS, MIN_SEGMENTS, SEGMENT_HP};

/// HP model selector used by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HpKind {
    #[default]
    Normal,
    Segmented,
}

impl HealthModel {
    /// Build a full pool; `value` is max HP or segment count depending on kind
    pub fn full(kind: HpKind, value: f32) -> Self {
        match kind {
            HpKind::Normal => {
                let max = clamp_max_hp(value);
                HealthModel::Normal { max, current: max }
            }
            HpKind::Segmented => {
                let segments = clamp_segments(value);
                HealthModel::Segmented { segments, current: segments }
            }
        }
    }

    pub fn kind(&self) -> HpKind {
        match self {
            HealthModel::Normal { .. } => HpKind::Normal,
            HealthModel::Segmented { .. } => HpKind::Segmented,
        }
    }

    /// Current value in the model's own unit
    pub fn current(&self) -> f32 {
        match *self {
            HealthModel::Normal { current, .. } => current,
            HealthModel::Segmented { current, .. } => current as f32,
        }
    }

    /// Maximum value in the model's own unit
    pub fn max(&self) -> f32 {
        match *self {
            HealthModel::Normal { max, .. } => max,
            HealthModel::Segmented { segments, .. } => segments as f32,
        }
    }

    /// Remaining share of the pool, for health bars
    pub fn fraction(&self) -> f32 {
        (self.current() / self.max()).clamp(0.0, 1.0)
    }

    pub fn is_depleted(&self) -> bool {
        self.current() <= 0.0
    }

    pub fn refill(&mut self) {
        match self {
            HealthModel::Normal { max, current } => *current = *max,
            HealthModel::Segmented { segments, current } => *current = *segments,
        }
    }

    /// Remove HP, returning the amount actually taken
    fn take(&mut self, raw: f32) -> f32 {
        match self {
            HealthModel::Normal { current, .. } => {
                let before = *current;
                *current = (*current - raw).max(0.0);
                before - *current
            }
            HealthModel::Segmented { current, .. } => {
                let loss = (raw / SEGMENT_HP).floor().max(1.0) as u32;
                let before = *current;
                *current = current.saturating_sub(loss);
                (before - *current) as f32
            }
        }
    }

    /// Add HP, clamped to the maximum. Segments heal one per `SEGMENT_HP`.
    pub fn heal(&mut self, amount: f32) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        match self {
            HealthModel::Normal { max, current } => *current = (*current + amount).min(*max),
            HealthModel::Segmented { segments, current } => {
                *current = (*current + (amount / SEGMENT_HP).floor() as u32).min(*segments)
            }
        }
    }

    /// Change the maximum (editor input), keeping current within range
    pub fn set_max(&mut self, value: f32) {
        match self {
            HealthModel::Normal { max, current } => {
                *max = clamp_max_hp(value);
                *current = current.clamp(0.0, *max);
            }
            HealthModel::Segmented { segments, current } => {
                *segments = clamp_segments(value);
                *current = (*current).min(*segments);
            }
        }
    }

    /// Switch model, carrying the maximum across
    pub fn set_kind(&mut self, kind: HpKind) {
        if kind != self.kind() {
            *self = HealthModel::full(kind, self.max());
        }
    }
}

/// Normal max HP is at least 1; garbage input falls back to 1
fn clamp_max_hp(value: f32) -> f32 {
    if value.is_finite() { value.max(1.0) } else { 1.0 }
}

fn clamp_segments(value: f32) -> u32 {
    if !value.is_finite() {
        return MIN_SEGMENTS;
    }
    (value.round() as i64).clamp(MIN_SEGMENTS as i64, MAX_SEGMENTS as i64) as u32
}

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// HP actually removed
    pub dealt: f32,
    /// This hit defeated the ball
    pub defeated: bool,
}

/// Apply raw damage to a ball, respecting its HP model
///
/// Defeated balls and non-positive amounts are ignored. The defeat flag is
/// set only on the hit that empties the pool.
pub fn apply_damage(victim: &mut Ball, raw: f32) -> DamageOutcome {
    if victim.defeated || !raw.is_finite() || raw <= 0.0 {
        return DamageOutcome::default();
    }
    let dealt = victim.health.take(raw);
    let defeated = victim.health.is_depleted();
    if defeated {
        victim.defeated = true;
        log::debug!("{} (#{}) defeated", victim.name, victim.id);
    }
    DamageOutcome { dealt, defeated }
}

/// Per-frame regeneration (normal HP only)
pub fn apply_regen(ball: &mut Ball, dt: f32) {
    if ball.defeated {
        return;
    }
    if let HealthModel::Normal { .. } = ball.health {
        let rate = ball.regen + ball.regen_bonus;
        if rate > 0.0 {
            ball.health.heal(rate * dt);
        }
    }
}
