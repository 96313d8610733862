//! Per-frame simulation step
//!
//! Advances a running arena by one capped timestep. Callable with synthetic
//! `dt` values; nothing here reads a clock.

use super::collision::{bounce_off_walls, resolve_ball_collisions};
use super::events::GameEvent;
use super::health::apply_regen;
use super::powerup::{apply_timed_effect, update_powerups};
use super::state::ArenaState;
use super::weapon::{fire_ranged, resolve_melee, rotate_blades, update_projectiles};
use super::zone::apply_zone;
use crate::Settings;

/// Advance the arena by one frame
///
/// `frame_dt` is capped at `settings.max_frame_dt` so slow frames cannot
/// tunnel balls through each other. Events are appended to `events`.
pub fn step(
    state: &mut ArenaState,
    settings: &Settings,
    frame_dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let dt = if frame_dt.is_finite() {
        frame_dt.clamp(0.0, settings.max_frame_dt)
    } else {
        0.0
    };
    state.elapsed += dt;

    // Deferred powerup reversions
    for effect in state.timeline.drain_due(state.elapsed) {
        if let Some(ball) = state.ball_mut(effect.ball_id()) {
            apply_timed_effect(ball, effect);
        }
    }

    for ball in &mut state.balls {
        apply_regen(ball, dt);
    }

    // Integrate and bounce off the walls
    let bounds = state.arena_bounds();
    for ball in state.balls.iter_mut().filter(|b| b.is_alive()) {
        ball.pos += ball.vel * ball.speed_factor * dt;
        bounce_off_walls(ball, &bounds);
    }

    resolve_ball_collisions(state, settings, events);

    rotate_blades(state, dt);
    resolve_melee(state, settings, events);
    fire_ranged(state, events);
    update_projectiles(state, settings, dt, events);

    apply_zone(state, dt, events);
    update_powerups(state, events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::health::HpKind;
    use crate::sim::powerup::PowerupTemplate;
    use crate::sim::state::{Appearance, Ball, HealthModel};
    use glam::Vec2;

    fn arena() -> ArenaState {
        ArenaState::new(800.0, 600.0, 2024)
    }

    fn ball(name: &str, health: HealthModel, damage: f32) -> Ball {
        let mut b = Ball::new(0, name, Appearance::Color("#fff".into()));
        b.health = health;
        b.damage = damage;
        b
    }

    #[test]
    fn test_dt_is_capped() {
        let mut state = arena();
        let mut events = Vec::new();
        step(&mut state, &Settings::default(), 1.0, &mut events);
        assert!((state.elapsed - 0.04).abs() < 1e-6);
        step(&mut state, &Settings::default(), f32::NAN, &mut events);
        assert!((state.elapsed - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_integration_and_wall_bounce() {
        let mut state = arena();
        let mut b = ball("Runner", HealthModel::default(), 0.0);
        b.pos = Vec2::new(785.0, 300.0);
        b.vel = Vec2::new(500.0, 0.0);
        state.insert_ball(b);
        step(&mut state, &Settings::default(), 0.02, &mut Vec::new());
        let b = &state.balls[0];
        assert_eq!(b.pos.x, 800.0 - b.radius);
        assert_eq!(b.vel.x, -500.0);
    }

    /// A normal ball repeatedly rams a five-segment ball
    #[test]
    fn test_segmented_ball_falls_after_five_qualifying_hits() {
        let mut state = arena();
        let settings = Settings::default();
        let a = state
            .insert_ball(ball("A", HealthModel::full(HpKind::Normal, 100.0), 10.0))
            .unwrap();
        let b = state
            .insert_ball(ball("B", HealthModel::full(HpKind::Segmented, 5.0), 10.0))
            .unwrap();
        let mut events = Vec::new();

        for hit in 1..=5u32 {
            {
                let ball_a = state.ball_mut(a).unwrap();
                ball_a.pos = Vec2::new(200.0, 200.0);
                ball_a.vel = Vec2::new(100.0, 0.0);
            }
            {
                let ball_b = state.ball_mut(b).unwrap();
                ball_b.pos = Vec2::new(230.0, 200.0);
                ball_b.vel = Vec2::new(-100.0, 0.0);
            }
            step(&mut state, &settings, 0.04, &mut events);

            // Park both apart until the pair cooldown has passed
            for (id, pos) in [(a, Vec2::new(100.0, 100.0)), (b, Vec2::new(600.0, 400.0))] {
                let parked = state.ball_mut(id).unwrap();
                parked.pos = pos;
                parked.vel = Vec2::ZERO;
            }
            for _ in 0..7 {
                step(&mut state, &settings, 0.04, &mut events);
            }

            let ball_a = state.ball(a).unwrap();
            let ball_b = state.ball(b).unwrap();
            assert_eq!(ball_a.health.current(), 100.0 - 10.0 * hit as f32);
            assert_eq!(ball_b.health.current(), 5.0 - hit as f32);
            assert_eq!(ball_b.defeated, hit == 5);
        }

        let defeats = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Defeated { ball_id } if *ball_id == b))
            .count();
        assert_eq!(defeats, 1);
    }

    #[test]
    fn test_defeated_ball_neither_moves_nor_takes_damage() {
        let mut state = arena();
        let mut dead = ball("Dead", HealthModel::Normal { max: 100.0, current: 0.0 }, 10.0);
        dead.defeated = true;
        dead.pos = Vec2::new(300.0, 300.0);
        dead.vel = Vec2::new(50.0, 50.0);
        dead.regen = 10.0;
        let dead = state.insert_ball(dead).unwrap();
        let mut live = ball("Live", HealthModel::default(), 10.0);
        live.pos = Vec2::new(300.0, 320.0);
        state.insert_ball(live);

        for _ in 0..10 {
            step(&mut state, &Settings::default(), 0.016, &mut Vec::new());
        }
        let dead = state.ball(dead).unwrap();
        assert_eq!(dead.pos, Vec2::new(300.0, 300.0));
        assert_eq!(dead.health.current(), 0.0);
    }

    #[test]
    fn test_temporary_speed_buff_reverts_through_step() {
        let mut state = arena();
        let mut runner = ball("Runner", HealthModel::default(), 0.0);
        runner.pos = Vec2::new(400.0, 300.0);
        runner.vel = Vec2::new(0.0, 10.0);
        let id = state.insert_ball(runner).unwrap();
        let template = PowerupTemplate {
            speed_multiplier: 3.0,
            effect_duration: 0.1,
            ..Default::default()
        };
        crate::sim::powerup::apply_powerup(&mut state, &template, 0, id, &mut Vec::new());

        // Moves three times as far while buffed
        step(&mut state, &Settings::default(), 0.04, &mut Vec::new());
        assert!((state.ball(id).unwrap().pos.y - 301.2).abs() < 1e-3);

        for _ in 0..4 {
            step(&mut state, &Settings::default(), 0.04, &mut Vec::new());
        }
        let runner = state.ball(id).unwrap();
        assert_eq!(runner.speed_factor, 1.0);
        assert!((runner.vel.y - 10.0).abs() < 1e-4);
    }

    /// A buffed ball trades velocity in a collision, then the buff expires
    #[test]
    fn test_speed_buff_does_not_leak_through_collisions() {
        let mut state = arena();
        let settings = Settings::default();
        let mut a = ball("A", HealthModel::default(), 0.0);
        a.pos = Vec2::new(300.0, 300.0);
        a.vel = Vec2::new(100.0, 0.0);
        let a = state.insert_ball(a).unwrap();
        let mut b = ball("B", HealthModel::default(), 0.0);
        b.pos = Vec2::new(400.0, 300.0);
        b.vel = Vec2::new(-100.0, 0.0);
        let b = state.insert_ball(b).unwrap();

        let template = PowerupTemplate {
            speed_multiplier: 3.0,
            effect_duration: 1.0,
            ..Default::default()
        };
        crate::sim::powerup::apply_powerup(&mut state, &template, 0, a, &mut Vec::new());

        let mut events = Vec::new();
        for _ in 0..50 {
            step(&mut state, &settings, 0.04, &mut events);
        }
        assert!(events.iter().any(|e| matches!(e, GameEvent::BallCollision { .. })));

        let ball_a = state.ball(a).unwrap();
        let ball_b = state.ball(b).unwrap();
        assert_eq!(ball_a.speed_factor, 1.0);
        assert_eq!(ball_b.speed_factor, 1.0);
        assert!((ball_a.vel.length() - 100.0).abs() < 1e-3);
        assert!((ball_b.vel.length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_regen_applies_per_frame() {
        let mut state = arena();
        let mut b = ball("Healer", HealthModel::Normal { max: 100.0, current: 50.0 }, 0.0);
        b.pos = Vec2::new(400.0, 300.0);
        b.regen = 10.0;
        state.insert_ball(b);
        for _ in 0..25 {
            step(&mut state, &Settings::default(), 0.04, &mut Vec::new());
        }
        assert!((state.balls[0].health.current() - 60.0).abs() < 1e-2);
    }
}
