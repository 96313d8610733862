//! Arena state and core entity types
//!
//! All mutable state for one arena lives here. The editor owns it between
//! battles, the simulation owns it while a battle runs.

use std::collections::HashMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::powerup::{PowerupField, PowerupTemplate};
use super::schedule::Timeline;
use super::zone::{Zone, ZoneConfig};
use crate::ArenaError;
use crate::consts::*;
use crate::heading_from_degrees;

/// How a ball is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Appearance {
    /// CSS color string
    Color(String),
    /// Image source (data URL or path)
    Image(String),
}

impl Appearance {
    /// Random pastel color in the same range the editor uses
    pub fn random_color<R: Rng>(rng: &mut R) -> Self {
        let hue = rng.random_range(0..360);
        let sat = 70 + rng.random_range(0..20);
        Appearance::Color(format!("hsl({hue} {sat}% 60%)"))
    }
}

/// Health pool of a ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum HealthModel {
    /// Continuous HP, accepts fractional damage and regen
    Normal { max: f32, current: f32 },
    /// Whole segments, every hit removes at least one
    Segmented { segments: u32, current: u32 },
}

impl Default for HealthModel {
    fn default() -> Self {
        HealthModel::Normal {
            max: BALL_MAX_HP,
            current: BALL_MAX_HP,
        }
    }
}

/// Spinning blade attached to a ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeWeapon {
    pub damage: f32,
    /// Degrees per second, sign gives direction
    pub rot_speed: f32,
    /// Chance (0-100) to negate a blade clash
    pub parry: f32,
    /// Tip radius
    pub width: f32,
    /// Distance from ball edge to tip
    pub length: f32,
    /// Current orientation in degrees, [0, 360)
    pub angle: f32,
}

impl Default for MeleeWeapon {
    fn default() -> Self {
        Self {
            damage: 1.0,
            rot_speed: 180.0,
            parry: 20.0,
            width: 6.0,
            length: 26.0,
            angle: 0.0,
        }
    }
}

/// Turret that fires projectiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedWeapon {
    pub lock_range: f32,
    /// Seconds between shots
    pub fire_cooldown: f32,
    pub proj_speed: f32,
    pub proj_damage: f32,
    /// 0 disables homing
    pub proj_homing_range: f32,
    /// Homing blend rate per second
    pub proj_turn: f32,
    pub proj_radius: f32,
    pub proj_lifetime: f32,
    /// Battle time of the last shot
    pub last_fired: f32,
}

impl Default for RangedWeapon {
    fn default() -> Self {
        Self {
            lock_range: 300.0,
            fire_cooldown: 1.0,
            proj_speed: 420.0,
            proj_damage: 8.0,
            proj_homing_range: 0.0,
            proj_turn: 0.0,
            proj_radius: PROJECTILE_RADIUS,
            proj_lifetime: PROJECTILE_LIFETIME,
            last_fired: 0.0,
        }
    }
}

/// Weapon loadout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Weapon {
    #[default]
    None,
    Melee(MeleeWeapon),
    Ranged(RangedWeapon),
}

impl Weapon {
    /// Put angle and timers back to their pre-battle values
    pub fn reset(&mut self) {
        match self {
            Weapon::None => {}
            Weapon::Melee(melee) => melee.angle = 0.0,
            Weapon::Ranged(ranged) => ranged.last_fired = 0.0,
        }
    }
}

/// A combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub name: String,
    pub appearance: Appearance,
    pub radius: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Editor-placed start position
    pub spawn: Vec2,
    pub health: HealthModel,
    /// HP per second (normal health only)
    pub regen: f32,
    /// Extra regen granted by powerups
    #[serde(default)]
    pub regen_bonus: f32,
    /// Contact damage
    pub damage: f32,
    /// Extra contact damage granted by powerups
    #[serde(default)]
    pub damage_bonus: f32,
    /// Launch speed at battle start
    pub speed: f32,
    /// Movement multiplier granted by powerups
    #[serde(default = "unit_factor")]
    pub speed_factor: f32,
    pub weapon: Weapon,
    /// The weapon only counts when this is set
    pub weapon_enabled: bool,
    pub defeated: bool,
}

fn unit_factor() -> f32 {
    1.0
}

impl Ball {
    pub fn new(id: u32, name: impl Into<String>, appearance: Appearance) -> Self {
        Self {
            id,
            name: name.into(),
            appearance,
            radius: BALL_RADIUS,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            spawn: Vec2::ZERO,
            health: HealthModel::default(),
            regen: 0.0,
            regen_bonus: 0.0,
            damage: BALL_DAMAGE,
            damage_bonus: 0.0,
            speed: BALL_SPEED,
            speed_factor: 1.0,
            weapon: Weapon::None,
            weapon_enabled: false,
            defeated: false,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.defeated
    }

    /// Contact damage including powerup bonuses
    pub fn contact_damage(&self) -> f32 {
        (self.damage + self.damage_bonus).max(0.0)
    }

    /// Melee weapon, if equipped and enabled
    pub fn melee(&self) -> Option<&MeleeWeapon> {
        match (&self.weapon, self.weapon_enabled) {
            (Weapon::Melee(melee), true) => Some(melee),
            _ => None,
        }
    }

    pub fn melee_mut(&mut self) -> Option<&mut MeleeWeapon> {
        match (&mut self.weapon, self.weapon_enabled) {
            (Weapon::Melee(melee), true) => Some(melee),
            _ => None,
        }
    }

    pub fn ranged_mut(&mut self) -> Option<&mut RangedWeapon> {
        match (&mut self.weapon, self.weapon_enabled) {
            (Weapon::Ranged(ranged), true) => Some(ranged),
            _ => None,
        }
    }
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    /// Ball that fired it (never hit by its own shot)
    pub owner: u32,
    pub pos: Vec2,
    /// Position before the last integration, for swept hit tests
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub radius: f32,
    pub spawned_at: f32,
    pub lifetime: f32,
    pub homing_range: f32,
    pub turn_rate: f32,
}

impl Projectile {
    pub fn expired(&self, now: f32) -> bool {
        now - self.spawned_at >= self.lifetime
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Grow (or shrink with a negative margin) on every side
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }
}

/// Deferred effects applied by the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimedEffect {
    /// Undo a velocity multiplier
    RevertSpeed { ball_id: u32, factor: f32 },
    /// Undo a contact damage bonus
    RevertDamage { ball_id: u32, amount: f32 },
    /// Undo a regen bonus
    RevertRegen { ball_id: u32, amount: f32 },
}

/// Complete arena state
#[derive(Debug, Clone)]
pub struct ArenaState {
    pub width: f32,
    pub height: f32,
    /// Seed for reproducible battles
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Battle time in seconds (frame clock)
    pub elapsed: f32,
    /// Balls in creation order (sorted by id)
    pub balls: Vec<Ball>,
    pub projectiles: Vec<Projectile>,
    pub zone: Zone,
    pub powerups: PowerupField,
    /// Scheduled reversions of temporary effects
    pub timeline: Timeline<TimedEffect>,
    /// Last contact-damage time per unordered pair (low id first)
    pub(crate) contact_hits: HashMap<(u32, u32), f32>,
    /// Last melee hit time per (attacker, victim)
    pub(crate) melee_hits: HashMap<(u32, u32), f32>,
    /// Balls ever created, used for default names
    created_count: u32,
    next_id: u32,
}

impl ArenaState {
    pub fn new(width: f32, height: f32, seed: u64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            elapsed: 0.0,
            balls: Vec::new(),
            projectiles: Vec::new(),
            zone: Zone::default(),
            powerups: PowerupField::default(),
            timeline: Timeline::new(),
            contact_hits: HashMap::new(),
            melee_hits: HashMap::new(),
            created_count: 0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// The playable rectangle
    pub fn arena_bounds(&self) -> Rect {
        Rect::new(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    /// Install zone settings
    pub fn set_zone(&mut self, config: ZoneConfig) {
        self.zone = Zone::new(config);
    }

    /// Install powerup templates and roll their first spawn timers
    pub fn set_powerups(&mut self, templates: Vec<PowerupTemplate>) {
        self.powerups = PowerupField::new(templates);
        self.powerups.reset(self.elapsed, &mut self.rng);
    }

    /// Add a default ball ("Ball N", random color). No-op when full.
    pub fn add_ball(&mut self) -> Option<u32> {
        if self.balls.len() >= MAX_BALLS {
            return None;
        }
        let n = self.created_count + 1;
        let appearance = Appearance::random_color(&mut self.rng);
        let mut ball = Ball::new(0, format!("Ball {n}"), appearance);
        // Staggered placement so new balls don't stack
        let step = n as f32 * 40.0;
        ball.spawn = Vec2::new(
            80.0 + step % (self.width - 80.0).max(1.0),
            60.0 + step % (self.height - 80.0).max(1.0),
        );
        ball.pos = ball.spawn;
        self.insert_ball(ball)
    }

    /// Add a configured ball, assigning it a fresh id. No-op when full.
    pub fn insert_ball(&mut self, mut ball: Ball) -> Option<u32> {
        if self.balls.len() >= MAX_BALLS {
            log::warn!("Arena full ({MAX_BALLS} balls), ignoring {}", ball.name);
            return None;
        }
        self.created_count += 1;
        ball.id = self.next_entity_id();
        let id = ball.id;
        self.balls.push(ball);
        Some(id)
    }

    /// Remove a ball (editor only)
    pub fn remove_ball(&mut self, id: u32) -> Result<Ball, ArenaError> {
        let index = self
            .balls
            .iter()
            .position(|b| b.id == id)
            .ok_or(ArenaError::UnknownBall(id))?;
        Ok(self.balls.remove(index))
    }

    pub fn ball(&self, id: u32) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn ball_mut(&mut self, id: u32) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.id == id)
    }

    /// Balls still in the fight
    pub fn alive_count(&self) -> usize {
        self.balls.iter().filter(|b| b.is_alive()).count()
    }

    /// Prepare every entity for a fresh battle
    pub fn reset_for_battle(&mut self) -> Result<(), ArenaError> {
        let count = self.balls.len();
        if count < MIN_ENTRANTS {
            return Err(ArenaError::InsufficientEntrants { count });
        }

        self.elapsed = 0.0;
        self.projectiles.clear();
        self.timeline.clear();
        self.contact_hits.clear();
        self.melee_hits.clear();

        let bounds = self.arena_bounds();
        for ball in &mut self.balls {
            let inner = bounds.expand(-ball.radius);
            ball.pos = ball.spawn.clamp(inner.min, inner.max.max(inner.min));
            ball.health.refill();
            ball.regen_bonus = 0.0;
            ball.damage_bonus = 0.0;
            ball.speed_factor = 1.0;
            ball.defeated = false;
            ball.weapon.reset();
            let heading = heading_from_degrees(self.rng.random_range(0.0..360.0));
            ball.vel = heading * ball.speed;
        }

        self.zone.reset();
        self.powerups.reset(0.0, &mut self.rng);
        Ok(())
    }

    /// Leave the battle with positions kept and everything at rest
    pub fn freeze(&mut self) {
        for ball in &mut self.balls {
            ball.vel = Vec2::ZERO;
        }
        self.projectiles.clear();
        self.timeline.clear();
    }
}
