//! Powerup templates, spawning and pickup effects
//!
//! Each template runs its own spawn timer. Instances sit in the arena until
//! a ball touches them or they decay. Temporary effects are undone through
//! the arena timeline.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::{DamageSource, GameEvent, strike};
use super::state::{ArenaState, Ball, TimedEffect};

/// Designer-configured pickup type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupTemplate {
    pub name: String,
    pub color: String,
    /// Immediate HP change (negative hurts)
    pub hp_change: f32,
    /// Contact damage bonus
    pub damage_change: f32,
    /// Velocity multiplier (1 = unchanged)
    pub speed_multiplier: f32,
    /// Extra HP per second
    pub regen_bonus: f32,
    /// Seconds until damage/speed/regen changes are undone (0 = rest of battle)
    pub effect_duration: f32,
    /// Spawn interval range in seconds
    pub spawn_min: f32,
    pub spawn_max: f32,
    pub pickup_radius: f32,
    /// Seconds an unclaimed instance stays in the arena
    pub decay_time: f32,
}

impl Default for PowerupTemplate {
    fn default() -> Self {
        Self {
            name: "Powerup".to_string(),
            color: "#4ade80".to_string(),
            hp_change: 0.0,
            damage_change: 0.0,
            speed_multiplier: 1.0,
            regen_bonus: 0.0,
            effect_duration: 0.0,
            spawn_min: 5.0,
            spawn_max: 10.0,
            pickup_radius: 12.0,
            decay_time: 8.0,
        }
    }
}

impl PowerupTemplate {
    /// Clamp editor input into usable ranges
    pub fn sanitize(&mut self) {
        let d = Self::default();
        let finite = |v: f32, default: f32| if v.is_finite() { v } else { default };
        self.hp_change = finite(self.hp_change, d.hp_change);
        self.damage_change = finite(self.damage_change, d.damage_change);
        self.regen_bonus = finite(self.regen_bonus, d.regen_bonus);
        self.speed_multiplier = finite(self.speed_multiplier, d.speed_multiplier).clamp(0.1, 10.0);
        self.effect_duration = finite(self.effect_duration, d.effect_duration).max(0.0);
        self.spawn_min = finite(self.spawn_min, d.spawn_min).max(0.1);
        self.spawn_max = finite(self.spawn_max, d.spawn_max).max(self.spawn_min);
        self.pickup_radius = finite(self.pickup_radius, d.pickup_radius).max(1.0);
        self.decay_time = finite(self.decay_time, d.decay_time).max(0.1);
    }

    fn roll_delay<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.spawn_max > self.spawn_min {
            rng.random_range(self.spawn_min..=self.spawn_max)
        } else {
            self.spawn_min
        }
    }
}

/// A spawned pickup waiting to be claimed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupInstance {
    pub id: u32,
    /// Index into the template list
    pub template_id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub spawned_at: f32,
    pub expires_at: f32,
}

/// Templates, their spawn timers and the live instances
#[derive(Debug, Clone, Default)]
pub struct PowerupField {
    pub templates: Vec<PowerupTemplate>,
    /// Next spawn time per template
    next_spawn: Vec<f32>,
    pub instances: Vec<PowerupInstance>,
}

impl PowerupField {
    pub fn new(templates: Vec<PowerupTemplate>) -> Self {
        Self {
            templates,
            next_spawn: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// Clear instances and roll a fresh timer for every template
    pub fn reset<R: Rng>(&mut self, now: f32, rng: &mut R) {
        self.instances.clear();
        self.next_spawn = self
            .templates
            .iter()
            .map(|t| now + t.roll_delay(rng))
            .collect();
    }

    pub fn next_spawn_at(&self, template_id: usize) -> Option<f32> {
        self.next_spawn.get(template_id).copied()
    }
}

/// Expire, spawn and collect powerups for this frame
pub fn update_powerups(state: &mut ArenaState, events: &mut Vec<GameEvent>) {
    let now = state.elapsed;

    state.powerups.instances.retain(|inst| {
        let alive = now < inst.expires_at;
        if !alive {
            events.push(GameEvent::PowerupExpired { instance_id: inst.id });
        }
        alive
    });

    spawn_due(state, now, events);

    // First ball (in id order) touching an instance claims it
    let mut claims: Vec<(usize, u32)> = Vec::new();
    for (index, inst) in state.powerups.instances.iter().enumerate() {
        let claimant = state
            .balls
            .iter()
            .filter(|b| b.is_alive())
            .find(|b| b.pos.distance(inst.pos) <= inst.radius + b.radius);
        if let Some(ball) = claimant {
            claims.push((index, ball.id));
        }
    }

    // Remove back to front so earlier indices stay valid
    for (index, ball_id) in claims.into_iter().rev() {
        let inst = state.powerups.instances.remove(index);
        let Some(template) = state.powerups.templates.get(inst.template_id as usize).cloned()
        else {
            continue;
        };
        events.push(GameEvent::PowerupCollected {
            instance_id: inst.id,
            template_id: inst.template_id,
            ball_id,
        });
        log::debug!("Ball #{} collected {}", ball_id, template.name);
        apply_powerup(state, &template, inst.template_id, ball_id, events);
    }
}

fn spawn_due(state: &mut ArenaState, now: f32, events: &mut Vec<GameEvent>) {
    let due: Vec<usize> = (0..state.powerups.templates.len())
        .filter(|&i| state.powerups.next_spawn_at(i).is_some_and(|t| now >= t))
        .collect();

    let bounds = state.arena_bounds();
    for template_id in due {
        let template = state.powerups.templates[template_id].clone();
        let area = bounds.expand(-template.pickup_radius);
        let rng = state.rng();
        let pos = Vec2::new(
            random_between(rng, area.min.x, area.max.x),
            random_between(rng, area.min.y, area.max.y),
        );
        let delay = template.roll_delay(rng);
        let id = state.next_entity_id();

        state.powerups.next_spawn[template_id] = now + delay;
        state.powerups.instances.push(PowerupInstance {
            id,
            template_id: template_id as u32,
            pos,
            radius: template.pickup_radius,
            spawned_at: now,
            expires_at: now + template.decay_time,
        });
        events.push(GameEvent::PowerupSpawned {
            instance_id: id,
            template_id: template_id as u32,
        });
    }
}

/// Uniform sample that tolerates an empty range (arena smaller than the pickup)
fn random_between<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { (lo + hi) * 0.5 }
}

/// Apply a template's effect to one ball, scheduling reversions
pub fn apply_powerup(
    state: &mut ArenaState,
    template: &PowerupTemplate,
    template_id: u32,
    ball_id: u32,
    events: &mut Vec<GameEvent>,
) {
    let revert_at = state.elapsed + template.effect_duration;
    let temporary = template.effect_duration > 0.0;
    let Some(ball) = state.ball_mut(ball_id) else {
        return;
    };
    if !ball.is_alive() {
        return;
    }

    if template.hp_change > 0.0 {
        ball.health.heal(template.hp_change);
    } else if template.hp_change < 0.0 {
        strike(ball, -template.hp_change, DamageSource::Powerup(template_id), events);
        if !ball.is_alive() {
            return;
        }
    }

    let mut reverts = Vec::new();
    if template.damage_change != 0.0 {
        ball.damage_bonus += template.damage_change;
        reverts.push(TimedEffect::RevertDamage { ball_id, amount: template.damage_change });
    }
    if template.speed_multiplier != 1.0 {
        ball.speed_factor *= template.speed_multiplier;
        reverts.push(TimedEffect::RevertSpeed { ball_id, factor: template.speed_multiplier });
    }
    if template.regen_bonus != 0.0 {
        ball.regen_bonus += template.regen_bonus;
        reverts.push(TimedEffect::RevertRegen { ball_id, amount: template.regen_bonus });
    }

    if temporary {
        for effect in reverts {
            state.timeline.schedule(revert_at, effect);
        }
    }
}

/// Undo a temporary effect
pub fn apply_timed_effect(ball: &mut Ball, effect: TimedEffect) {
    match effect {
        TimedEffect::RevertSpeed { factor, .. } => {
            if factor > 0.0 {
                ball.speed_factor /= factor;
            }
        }
        TimedEffect::RevertDamage { amount, .. } => ball.damage_bonus -= amount,
        TimedEffect::RevertRegen { amount, .. } => ball.regen_bonus -= amount,
    }
}

impl TimedEffect {
    pub fn ball_id(&self) -> u32 {
        match *self {
            TimedEffect::RevertSpeed { ball_id, .. }
            | TimedEffect::RevertDamage { ball_id, .. }
            | TimedEffect::RevertRegen { ball_id, .. } => ball_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Appearance, HealthModel};

    fn arena_with_ball(pos: Vec2) -> (ArenaState, u32) {
        let mut state = ArenaState::new(400.0, 300.0, 5);
        let mut ball = Ball::new(0, "Picker", Appearance::Color("#abc".into()));
        ball.pos = pos;
        ball.spawn = pos;
        ball.vel = Vec2::new(100.0, 0.0);
        let id = state.insert_ball(ball).unwrap();
        (state, id)
    }

    #[test]
    fn test_heal_is_clamped_to_max() {
        let (mut state, id) = arena_with_ball(Vec2::new(50.0, 50.0));
        state.ball_mut(id).unwrap().health = HealthModel::Normal { max: 100.0, current: 80.0 };
        let template = PowerupTemplate { hp_change: 25.0, ..Default::default() };
        apply_powerup(&mut state, &template, 0, id, &mut Vec::new());
        assert_eq!(state.ball(id).unwrap().health.current(), 100.0);
    }

    #[test]
    fn test_temporary_speed_buff_reverts() {
        let (mut state, id) = arena_with_ball(Vec2::new(50.0, 50.0));
        let template = PowerupTemplate {
            speed_multiplier: 2.0,
            effect_duration: 3.0,
            ..Default::default()
        };
        apply_powerup(&mut state, &template, 0, id, &mut Vec::new());
        let ball = state.ball(id).unwrap();
        assert_eq!(ball.speed_factor, 2.0);
        // The buff scales movement, not the velocity that collisions exchange
        assert_eq!(ball.vel, Vec2::new(100.0, 0.0));
        assert_eq!(state.timeline.next_due(), Some(3.0));

        for effect in state.timeline.drain_due(3.0) {
            let ball = state.ball_mut(effect.ball_id()).unwrap();
            apply_timed_effect(ball, effect);
        }
        assert_eq!(state.ball(id).unwrap().speed_factor, 1.0);
    }

    #[test]
    fn test_permanent_effect_not_scheduled() {
        let (mut state, id) = arena_with_ball(Vec2::new(50.0, 50.0));
        let template = PowerupTemplate { damage_change: 5.0, ..Default::default() };
        apply_powerup(&mut state, &template, 0, id, &mut Vec::new());
        assert_eq!(state.ball(id).unwrap().contact_damage(), 15.0);
        assert!(state.timeline.is_empty());
    }

    #[test]
    fn test_spawn_decay_and_pickup() {
        let (mut state, id) = arena_with_ball(Vec2::new(-1000.0, -1000.0));
        state.set_powerups(vec![PowerupTemplate {
            hp_change: 10.0,
            spawn_min: 1.0,
            spawn_max: 1.0,
            decay_time: 2.0,
            ..Default::default()
        }]);
        let mut events = Vec::new();

        state.elapsed = 0.5;
        update_powerups(&mut state, &mut events);
        assert!(state.powerups.instances.is_empty());

        state.elapsed = 1.0;
        update_powerups(&mut state, &mut events);
        assert_eq!(state.powerups.instances.len(), 1);
        assert_eq!(state.powerups.next_spawn_at(0), Some(2.0));
        let first = state.powerups.instances[0].id;

        // Unclaimed instance decays, the next one spawns
        state.elapsed = 3.0;
        update_powerups(&mut state, &mut events);
        assert!(events.contains(&GameEvent::PowerupExpired { instance_id: first }));
        assert_eq!(state.powerups.instances.len(), 1);

        // Walk onto the newest instance
        let target = state.powerups.instances[0].pos;
        let ball = state.ball_mut(id).unwrap();
        ball.pos = target;
        ball.health = HealthModel::Normal { max: 100.0, current: 50.0 };
        update_powerups(&mut state, &mut events);
        assert!(state.powerups.instances.is_empty());
        assert_eq!(state.ball(id).unwrap().health.current(), 60.0);
    }
}
