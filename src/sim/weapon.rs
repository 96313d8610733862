//! Melee blades and ranged turrets
//!
//! Melee: the blade tip orbits the ball at `radius + length`; a tip touching
//! an enemy deals damage unless both blades clash and the parry roll wins.
//! Ranged: shots at the nearest locked target on a fixed cooldown, with
//! optional homing projectiles.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;

use super::collision::{circle_segment_overlap, circles_overlap, point_in_rect};
use super::events::{DamageSource, GameEvent, strike};
use super::state::{ArenaState, Ball, MeleeWeapon, Projectile, Weapon};
use crate::{Settings, heading_from_degrees, normalize_degrees};

/// World position of a blade tip
pub fn melee_tip(ball: &Ball, melee: &MeleeWeapon) -> Vec2 {
    ball.pos + heading_from_degrees(melee.angle) * (ball.radius + melee.length)
}

/// Spin every living ball's blade
pub fn rotate_blades(state: &mut ArenaState, dt: f32) {
    for ball in state.balls.iter_mut().filter(|b| b.is_alive()) {
        if let Some(melee) = ball.melee_mut() {
            melee.angle = normalize_degrees(melee.angle + melee.rot_speed * dt);
        }
    }
}

/// Blade data captured before any damage is applied this frame
struct Blade {
    index: usize,
    id: u32,
    tip: Vec2,
    width: f32,
    damage: f32,
    parry: f32,
}

/// Resolve blade hits and blade clashes for this frame
pub fn resolve_melee(state: &mut ArenaState, settings: &Settings, events: &mut Vec<GameEvent>) {
    let now = state.elapsed;
    let blades: Vec<Blade> = state
        .balls
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_alive())
        .filter_map(|(index, b)| {
            b.melee().map(|m| Blade {
                index,
                id: b.id,
                tip: melee_tip(b, m),
                width: m.width,
                damage: m.damage,
                parry: m.parry,
            })
        })
        .collect();
    if blades.is_empty() {
        return;
    }

    // One parry roll per clashing pair per frame
    let mut clashes: BTreeMap<(u32, u32), bool> = BTreeMap::new();
    let mut hits: Vec<(u32, usize, f32)> = Vec::new();

    for blade in &blades {
        for (victim_index, victim) in state.balls.iter().enumerate() {
            if victim_index == blade.index || !victim.is_alive() {
                continue;
            }
            if !circles_overlap(blade.tip, blade.width, victim.pos, victim.radius) {
                continue;
            }
            let clash = blades.iter().find(|other| {
                other.index == victim_index
                    && circles_overlap(blade.tip, blade.width, other.tip, other.width)
            });
            if let Some(other) = clash {
                let key = (blade.id.min(other.id), blade.id.max(other.id));
                let chance = blade.parry.max(other.parry);
                let rng = &mut state.rng;
                let parried = *clashes
                    .entry(key)
                    .or_insert_with(|| rng.random_range(0.0..100.0) < chance);
                if parried {
                    continue;
                }
            }
            hits.push((blade.id, victim_index, blade.damage));
        }
    }

    for (&(a, b), _) in clashes.iter().filter(|(_, parried)| **parried) {
        for id in [a, b] {
            if let Some(melee) = state.ball_mut(id).and_then(|ball| ball.melee_mut()) {
                melee.rot_speed = -melee.rot_speed;
            }
        }
        log::debug!("Blades of #{} and #{} parried", a, b);
        events.push(GameEvent::Parried { a, b });
    }

    let cooldown = settings.melee_hit_cooldown;
    for (attacker, victim_index, damage) in hits {
        let victim_id = state.balls[victim_index].id;
        if cooldown > 0.0 {
            let key = (attacker, victim_id);
            let ready = state
                .melee_hits
                .get(&key)
                .is_none_or(|&last| now - last >= cooldown);
            if !ready {
                continue;
            }
            state.melee_hits.insert(key, now);
        }
        strike(&mut state.balls[victim_index], damage, DamageSource::Melee(attacker), events);
    }
}

/// Fire every ranged weapon whose cooldown has elapsed
pub fn fire_ranged(state: &mut ArenaState, events: &mut Vec<GameEvent>) {
    let now = state.elapsed;
    for index in 0..state.balls.len() {
        let shooter = &state.balls[index];
        if !shooter.is_alive() || !shooter.weapon_enabled {
            continue;
        }
        let Weapon::Ranged(gun) = &shooter.weapon else {
            continue;
        };
        if now - gun.last_fired < gun.fire_cooldown {
            continue;
        }

        // Nearest living enemy inside lock range, straight-line aim
        let target = state
            .balls
            .iter()
            .filter(|other| other.id != shooter.id && other.is_alive())
            .map(|other| (other.pos, other.pos.distance(shooter.pos)))
            .filter(|&(_, dist)| dist <= gun.lock_range)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let random_dir = heading_from_degrees(state.rng.random_range(0.0..360.0));
        let dir = match target {
            Some((pos, _)) => (pos - shooter.pos).normalize_or(random_dir),
            None => random_dir,
        };

        let owner = shooter.id;
        let spawn = shooter.pos + dir * (shooter.radius + gun.proj_radius);
        let mut projectile = Projectile {
            id: 0,
            owner,
            pos: spawn,
            prev_pos: spawn,
            vel: dir * gun.proj_speed,
            damage: gun.proj_damage,
            radius: gun.proj_radius,
            spawned_at: now,
            lifetime: gun.proj_lifetime,
            homing_range: gun.proj_homing_range,
            turn_rate: gun.proj_turn,
        };
        projectile.id = state.next_entity_id();
        events.push(GameEvent::ProjectileFired {
            owner,
            projectile_id: projectile.id,
        });
        state.projectiles.push(projectile);

        if let Some(gun) = state.balls[index].ranged_mut() {
            gun.last_fired = now;
        }
    }
}

/// Steer a projectile toward the nearest enemy inside its homing range
///
/// A linear blend of the velocity toward the target direction, speed kept.
fn steer_projectile(projectile: &mut Projectile, balls: &[Ball], dt: f32) {
    if projectile.homing_range <= 0.0 || projectile.turn_rate <= 0.0 {
        return;
    }
    let target = balls
        .iter()
        .filter(|b| b.is_alive() && b.id != projectile.owner)
        .map(|b| (b.pos, b.pos.distance(projectile.pos)))
        .filter(|&(_, dist)| dist <= projectile.homing_range)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let Some((target_pos, _)) = target else {
        return;
    };
    let speed = projectile.vel.length();
    let desired = (target_pos - projectile.pos).normalize_or_zero() * speed;
    let blend = (projectile.turn_rate * dt).clamp(0.0, 1.0);
    let steered = projectile.vel.lerp(desired, blend);
    projectile.vel = steered.normalize_or(desired.normalize_or_zero()) * speed;
}

/// Move projectiles, apply hits and drop spent shots
pub fn update_projectiles(
    state: &mut ArenaState,
    settings: &Settings,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let now = state.elapsed;
    let bounds = state
        .arena_bounds()
        .expand(settings.projectile_bounds_margin);

    for projectile in state.projectiles.iter_mut() {
        steer_projectile(projectile, &state.balls, dt);
        projectile.prev_pos = projectile.pos;
        projectile.pos += projectile.vel * dt;
    }

    let mut keep = vec![true; state.projectiles.len()];
    for (slot, projectile) in state.projectiles.iter().enumerate() {
        if projectile.expired(now) || !point_in_rect(projectile.pos, &bounds) {
            keep[slot] = false;
            continue;
        }
        // Closest victim along the swept path
        let victim = state
            .balls
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_alive() && b.id != projectile.owner)
            .filter(|(_, b)| {
                circle_segment_overlap(
                    b.pos,
                    b.radius + projectile.radius,
                    projectile.prev_pos,
                    projectile.pos,
                )
            })
            .min_by(|(_, a), (_, b)| {
                a.pos
                    .distance_squared(projectile.prev_pos)
                    .total_cmp(&b.pos.distance_squared(projectile.prev_pos))
            })
            .map(|(index, _)| index);
        if let Some(index) = victim {
            keep[slot] = false;
            let ball = &mut state.balls[index];
            events.push(GameEvent::ProjectileHit {
                projectile_id: projectile.id,
                ball_id: ball.id,
            });
            strike(ball, projectile.damage, DamageSource::Projectile(projectile.owner), events);
        }
    }

    let mut slots = keep.into_iter();
    state.projectiles.retain(|_| slots.next().unwrap_or(false));
}
