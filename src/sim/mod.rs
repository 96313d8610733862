//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Capped, caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod battle;
pub mod collision;
pub mod events;
pub mod health;
pub mod powerup;
pub mod schedule;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod weapon;
pub mod zone;

pub use battle::{Battle, BattlePhase};
pub use collision::{CollisionResult, circle_circle_collision, circle_segment_overlap, point_in_rect};
pub use events::{BattleOutcome, DamageSource, GameEvent, Winner};
pub use health::{DamageOutcome, HpKind, apply_damage};
pub use powerup::{PowerupInstance, PowerupTemplate};
pub use schedule::Timeline;
pub use snapshot::ArenaSnapshot;
pub use state::{
    Appearance, ArenaState, Ball, HealthModel, MeleeWeapon, Projectile, RangedWeapon, Rect, Weapon,
};
pub use tick::step;
pub use zone::{Zone, ZoneConfig, ZonePhase};
