//! Events emitted by the simulation for UI, audio and outcome reporting

use serde::Serialize;

use super::health::{DamageOutcome, apply_damage};
use super::state::{Appearance, Ball};
use super::zone::ZonePhase;

/// What dealt a hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "from")]
pub enum DamageSource {
    /// Body contact with another ball
    Contact(u32),
    /// Melee weapon of another ball
    Melee(u32),
    /// Projectile fired by another ball
    Projectile(u32),
    /// Standing outside the zone
    Zone,
    /// A harmful pickup (template index)
    Powerup(u32),
}

/// Winner of a finished battle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Winner {
    pub id: u32,
    pub name: String,
    pub appearance: Appearance,
}

/// Result reported once per battle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleOutcome {
    /// Sole survivor, if exactly one ball is left
    pub winner: Option<Winner>,
    /// Balls still standing when the battle ended
    pub survivors: usize,
    /// Battle time in seconds
    pub duration: f32,
    /// Ended by the "End Game" action rather than by elimination
    pub forced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum GameEvent {
    BallCollision { a: u32, b: u32 },
    Damaged { ball_id: u32, amount: f32, source: DamageSource },
    Defeated { ball_id: u32 },
    Parried { a: u32, b: u32 },
    ProjectileFired { owner: u32, projectile_id: u32 },
    ProjectileHit { projectile_id: u32, ball_id: u32 },
    PowerupSpawned { instance_id: u32, template_id: u32 },
    PowerupExpired { instance_id: u32 },
    PowerupCollected { instance_id: u32, template_id: u32, ball_id: u32 },
    ZonePhaseChanged { phase: ZonePhase },
    Loading,
    /// 3, 2, 1, then 0 for GO
    Countdown { value: u8 },
    BattleStarted,
    BattleEnded { outcome: BattleOutcome },
}

/// Damage a ball and record what happened
pub fn strike(
    victim: &mut Ball,
    amount: f32,
    source: DamageSource,
    events: &mut Vec<GameEvent>,
) -> DamageOutcome {
    let outcome = apply_damage(victim, amount);
    if outcome.dealt > 0.0 {
        events.push(GameEvent::Damaged {
            ball_id: victim.id,
            amount: outcome.dealt,
            source,
        });
    }
    if outcome.defeated {
        events.push(GameEvent::Defeated { ball_id: victim.id });
    }
    outcome
}
