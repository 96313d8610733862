//! Shrinking safe zone
//!
//! Phases are driven purely by battle time and only ever move forward:
//! Inactive -> VisibleStatic -> Shrinking -> Collapsed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{DamageSource, GameEvent, strike};
use super::state::{ArenaState, Rect};

/// Zone lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZonePhase {
    /// Not drawn, harmless
    #[default]
    Inactive,
    /// Drawn at its starting radius
    VisibleStatic,
    /// Radius falling linearly to zero
    Shrinking,
    /// Radius is zero
    Collapsed,
}

/// Designer settings for the zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub enabled: bool,
    /// Starting radius as a percentage of half the smaller arena dimension
    pub start_radius_pct: f32,
    /// Seconds before the zone appears
    pub spawn_delay: f32,
    /// Seconds (from battle start) before shrinking begins
    pub delay: f32,
    /// Seconds to shrink from full radius to zero
    pub duration: f32,
    /// Damage per second outside the zone
    pub dps: f32,
    /// Extra seconds after `delay` before damage starts
    pub damage_delay: f32,
    /// Center in relative arena coordinates (0..1)
    pub center: Vec2,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_radius_pct: 100.0,
            spawn_delay: 0.0,
            delay: 10.0,
            duration: 30.0,
            dps: 5.0,
            damage_delay: 0.0,
            center: Vec2::splat(0.5),
        }
    }
}

impl ZoneConfig {
    /// Clamp editor input into usable ranges
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        let fix = |value: f32, default: f32| if value.is_finite() { value.max(0.0) } else { default };
        self.start_radius_pct = fix(self.start_radius_pct, defaults.start_radius_pct).min(100.0);
        self.spawn_delay = fix(self.spawn_delay, defaults.spawn_delay);
        self.delay = fix(self.delay, defaults.delay);
        self.duration = fix(self.duration, defaults.duration);
        self.dps = fix(self.dps, defaults.dps);
        self.damage_delay = fix(self.damage_delay, defaults.damage_delay);
        if !self.center.is_finite() {
            self.center = defaults.center;
        }
        self.center = self.center.clamp(Vec2::ZERO, Vec2::ONE);
    }
}

/// Zone configuration plus the phase reached so far
#[derive(Debug, Clone, Default)]
pub struct Zone {
    pub config: ZoneConfig,
    pub phase: ZonePhase,
}

impl Zone {
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            config,
            phase: ZonePhase::Inactive,
        }
    }

    pub fn reset(&mut self) {
        self.phase = ZonePhase::Inactive;
    }

    /// Phase implied by the battle clock
    pub fn phase_at(&self, elapsed: f32) -> ZonePhase {
        let c = &self.config;
        if !c.enabled || elapsed < c.spawn_delay {
            ZonePhase::Inactive
        } else if elapsed < c.delay {
            ZonePhase::VisibleStatic
        } else if elapsed < c.delay + c.duration {
            ZonePhase::Shrinking
        } else {
            ZonePhase::Collapsed
        }
    }

    /// Advance the phase; returns the new phase on a transition
    pub fn update(&mut self, elapsed: f32) -> Option<ZonePhase> {
        let next = self.phase_at(elapsed);
        if next > self.phase {
            self.phase = next;
            Some(next)
        } else {
            None
        }
    }

    pub fn start_radius(&self, arena: &Rect) -> f32 {
        let size = arena.size();
        self.config.start_radius_pct / 100.0 * size.x.min(size.y) * 0.5
    }

    /// Current radius: constant until `delay`, then linear to zero over `duration`
    pub fn radius_at(&self, elapsed: f32, arena: &Rect) -> f32 {
        let c = &self.config;
        let start = self.start_radius(arena);
        if elapsed <= c.delay {
            return start;
        }
        let shrink_time = elapsed - c.delay;
        if c.duration <= 0.0 || shrink_time >= c.duration {
            return 0.0;
        }
        (start * (1.0 - shrink_time / c.duration)).max(0.0)
    }

    pub fn center(&self, arena: &Rect) -> Vec2 {
        arena.min + arena.size() * self.config.center
    }

    /// Whether balls outside the radius take damage right now
    pub fn is_damaging(&self, elapsed: f32) -> bool {
        let c = &self.config;
        c.enabled
            && self.phase_at(elapsed) != ZonePhase::Inactive
            && elapsed >= c.delay + c.damage_delay
    }
}

/// Advance the zone and damage every living ball outside it
pub fn apply_zone(state: &mut ArenaState, dt: f32, events: &mut Vec<GameEvent>) {
    let now = state.elapsed;
    if let Some(phase) = state.zone.update(now) {
        log::info!("Zone entered {:?} at {:.2}s", phase, now);
        events.push(GameEvent::ZonePhaseChanged { phase });
    }
    if !state.zone.is_damaging(now) {
        return;
    }

    let bounds = state.arena_bounds();
    let center = state.zone.center(&bounds);
    let radius = state.zone.radius_at(now, &bounds);
    let damage = state.zone.config.dps * dt;
    for ball in state.balls.iter_mut().filter(|b| b.is_alive()) {
        if ball.pos.distance(center) > radius {
            strike(ball, damage, DamageSource::Zone, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Ball, Appearance};
    use proptest::prelude::*;

    fn arena() -> Rect {
        Rect::new(Vec2::ZERO, Vec2::new(400.0, 200.0))
    }

    fn zone() -> Zone {
        Zone::new(ZoneConfig {
            enabled: true,
            start_radius_pct: 100.0,
            spawn_delay: 1.0,
            delay: 5.0,
            duration: 10.0,
            dps: 10.0,
            damage_delay: 2.0,
            center: Vec2::splat(0.5),
        })
    }

    #[test]
    fn test_phases() {
        let z = zone();
        assert_eq!(z.phase_at(0.5), ZonePhase::Inactive);
        assert_eq!(z.phase_at(1.0), ZonePhase::VisibleStatic);
        assert_eq!(z.phase_at(6.0), ZonePhase::Shrinking);
        assert_eq!(z.phase_at(15.0), ZonePhase::Collapsed);

        let off = Zone::new(ZoneConfig::default());
        assert_eq!(off.phase_at(100.0), ZonePhase::Inactive);
    }

    #[test]
    fn test_phase_never_reverses() {
        let mut z = zone();
        assert_eq!(z.update(6.0), Some(ZonePhase::Shrinking));
        assert_eq!(z.update(2.0), None);
        assert_eq!(z.phase, ZonePhase::Shrinking);
    }

    #[test]
    fn test_radius() {
        let z = zone();
        // Half of the smaller dimension
        assert_eq!(z.start_radius(&arena()), 100.0);
        assert_eq!(z.radius_at(3.0, &arena()), 100.0);
        assert!((z.radius_at(10.0, &arena()) - 50.0).abs() < 1e-3);
        assert_eq!(z.radius_at(15.0, &arena()), 0.0);
        assert_eq!(z.radius_at(99.0, &arena()), 0.0);
    }

    #[test]
    fn test_damage_only_after_damage_delay() {
        let z = zone();
        assert!(!z.is_damaging(6.9));
        assert!(z.is_damaging(7.0));
    }

    #[test]
    fn test_apply_zone_hits_balls_outside() {
        let mut state = ArenaState::new(400.0, 200.0, 3);
        state.zone = zone();
        let mut inside = Ball::new(1, "In", Appearance::Color("#111".into()));
        inside.pos = Vec2::new(200.0, 100.0);
        let mut outside = Ball::new(2, "Out", Appearance::Color("#222".into()));
        outside.pos = Vec2::new(10.0, 10.0);
        state.balls = vec![inside, outside];

        state.elapsed = 8.0;
        let mut events = Vec::new();
        apply_zone(&mut state, 0.5, &mut events);

        assert_eq!(state.balls[0].health.current(), 100.0);
        assert_eq!(state.balls[1].health.current(), 95.0);
        assert!(events.contains(&GameEvent::ZonePhaseChanged { phase: ZonePhase::Shrinking }));
    }

    proptest! {
        #[test]
        fn prop_radius_non_increasing(
            t1 in 5.0f32..30.0,
            dt in 0.0f32..10.0,
        ) {
            let z = zone();
            let a = z.radius_at(t1, &arena());
            let b = z.radius_at(t1 + dt, &arena());
            prop_assert!(b <= a);
            prop_assert!(b >= 0.0);
        }
    }
}
