//! Ball Arena - A physics battle arena for configurable balls
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, weapons, zone, powerups, battle flow)
//! - `roster`: Editor-facing configuration with silent clamping
//! - `settings`: Simulation tuning
//! - `platform`: Frame loop driver and browser binding

pub mod error;
pub mod platform;
pub mod roster;
pub mod settings;
pub mod sim;

pub use error::ArenaError;
pub use roster::{BallConfig, Roster};
pub use settings::{PhysicsVariant, Settings};
pub use sim::{Battle, BattlePhase};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Maximum number of balls in one arena
    pub const MAX_BALLS: usize = 10;
    /// Minimum entrants for a battle
    pub const MIN_ENTRANTS: usize = 2;
    /// Largest step the simulation will take (avoids tunneling on slow frames)
    pub const MAX_FRAME_DT: f32 = 0.04;

    /// Arena defaults (CSS pixels)
    pub const ARENA_WIDTH: f32 = 900.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 18.0;
    pub const BALL_MAX_HP: f32 = 100.0;
    pub const BALL_DAMAGE: f32 = 10.0;
    pub const BALL_SPEED: f32 = 220.0;
    /// Segmented HP bounds
    pub const MIN_SEGMENTS: u32 = 1;
    pub const MAX_SEGMENTS: u32 = 10;
    /// HP worth one segment when damaging or healing segmented balls
    pub const SEGMENT_HP: f32 = 10.0;

    /// Cooldown between contact hits for one pair of balls (seconds)
    pub const CONTACT_COOLDOWN: f32 = 0.25;
    /// Share of the speed differential handed over in the speed-transfer variant
    pub const SPEED_TRANSFER_FRACTION: f32 = 0.25;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 5.0;
    pub const PROJECTILE_LIFETIME: f32 = 3.0;
    /// Distance past the walls a projectile may travel before removal
    pub const PROJECTILE_BOUNDS_MARGIN: f32 = 20.0;

    /// Battle flow timing (seconds)
    pub const LOADING_DELAY: f32 = 0.65;
    pub const COUNTDOWN_TICK: f32 = 0.9;
    /// Countdown starts from this number, then shows GO
    pub const COUNTDOWN_FROM: u8 = 3;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit vector pointing along an angle given in degrees
#[inline]
pub fn heading_from_degrees(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}
