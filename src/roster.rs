//! Editor-facing arena configuration
//!
//! Rosters come from the page as JSON. Missing fields take defaults and
//! out-of-range numbers are clamped silently; only JSON that cannot be parsed
//! at all is an error.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::health::HpKind;
use crate::sim::powerup::PowerupTemplate;
use crate::sim::state::{Appearance, ArenaState, Ball, HealthModel, MeleeWeapon, RangedWeapon, Weapon};
use crate::sim::zone::ZoneConfig;
use crate::sim::Battle;
use crate::{ArenaError, Settings};

/// One ball as entered in the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    /// Defaults to "Ball N"
    pub name: Option<String>,
    /// CSS color; a random color is picked when neither color nor image is set
    pub color: Option<String>,
    /// Image source, drawn instead of the color
    pub image: Option<String>,
    pub hp_type: HpKind,
    /// Max HP for normal balls, segment count for segmented ones
    pub hp: f32,
    pub regen: f32,
    pub damage: f32,
    pub speed: f32,
    pub radius: f32,
    /// Spawn position; staggered automatically when absent
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub weapon_enabled: bool,
    pub weapon: Weapon,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            name: None,
            color: None,
            image: None,
            hp_type: HpKind::Normal,
            hp: BALL_MAX_HP,
            regen: 0.0,
            damage: BALL_DAMAGE,
            speed: BALL_SPEED,
            radius: BALL_RADIUS,
            x: None,
            y: None,
            weapon_enabled: false,
            weapon: Weapon::None,
        }
    }
}

/// Finite and within range, or the fallback
fn coerce(value: f32, default: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() { value.clamp(min, max) } else { default }
}

impl BallConfig {
    /// Clamp every numeric field into a usable range
    pub fn sanitize(&mut self) {
        let d = Self::default();
        // HealthModel::full clamps segments and max HP itself
        if !self.hp.is_finite() {
            self.hp = d.hp;
        }
        self.regen = coerce(self.regen, d.regen, 0.0, 1000.0);
        self.damage = coerce(self.damage, d.damage, 0.0, 10_000.0);
        self.speed = coerce(self.speed, d.speed, 0.0, 2000.0);
        self.radius = coerce(self.radius, d.radius, 4.0, 120.0);
        self.x = self.x.filter(|x| x.is_finite());
        self.y = self.y.filter(|y| y.is_finite());
        self.name = self
            .name
            .take()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        sanitize_weapon(&mut self.weapon);
    }

    /// Copy the configured values onto a ball created by the arena
    pub fn apply_to(&self, ball: &mut Ball) {
        if let Some(name) = &self.name {
            ball.name = name.clone();
        }
        if let Some(image) = &self.image {
            ball.appearance = Appearance::Image(image.clone());
        } else if let Some(color) = &self.color {
            ball.appearance = Appearance::Color(color.clone());
        }
        ball.health = HealthModel::full(self.hp_type, self.hp);
        ball.regen = self.regen;
        ball.damage = self.damage;
        ball.speed = self.speed;
        ball.radius = self.radius;
        if let (Some(x), Some(y)) = (self.x, self.y) {
            ball.spawn = Vec2::new(x, y);
            ball.pos = ball.spawn;
        }
        ball.weapon = self.weapon.clone();
        ball.weapon_enabled = self.weapon_enabled;
    }
}

fn sanitize_weapon(weapon: &mut Weapon) {
    match weapon {
        Weapon::None => {}
        Weapon::Melee(m) => {
            let d = MeleeWeapon::default();
            m.damage = coerce(m.damage, d.damage, 0.0, 10_000.0);
            m.rot_speed = coerce(m.rot_speed, d.rot_speed, -3600.0, 3600.0);
            m.parry = coerce(m.parry, d.parry, 0.0, 100.0);
            m.width = coerce(m.width, d.width, 1.0, 100.0);
            m.length = coerce(m.length, d.length, 0.0, 400.0);
            m.angle = 0.0;
        }
        Weapon::Ranged(r) => {
            let d = RangedWeapon::default();
            r.lock_range = coerce(r.lock_range, d.lock_range, 0.0, 5000.0);
            r.fire_cooldown = coerce(r.fire_cooldown, d.fire_cooldown, 0.05, 60.0);
            r.proj_speed = coerce(r.proj_speed, d.proj_speed, 1.0, 5000.0);
            r.proj_damage = coerce(r.proj_damage, d.proj_damage, 0.0, 10_000.0);
            r.proj_homing_range = coerce(r.proj_homing_range, d.proj_homing_range, 0.0, 5000.0);
            r.proj_turn = coerce(r.proj_turn, d.proj_turn, 0.0, 100.0);
            r.proj_radius = coerce(r.proj_radius, d.proj_radius, 1.0, 50.0);
            r.proj_lifetime = coerce(r.proj_lifetime, d.proj_lifetime, 0.1, 60.0);
            r.last_fired = 0.0;
        }
    }
}

/// A complete arena setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roster {
    pub width: f32,
    pub height: f32,
    pub seed: u64,
    pub balls: Vec<BallConfig>,
    pub zone: ZoneConfig,
    pub powerups: Vec<PowerupTemplate>,
    pub settings: Settings,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            seed: 1,
            balls: Vec::new(),
            zone: ZoneConfig::default(),
            powerups: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl Roster {
    /// Parse and sanitize a roster
    pub fn from_json(json: &str) -> Result<Self, ArenaError> {
        let mut roster: Roster = serde_json::from_str(json)?;
        roster.sanitize();
        Ok(roster)
    }

    pub fn to_json(&self) -> Result<String, ArenaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn sanitize(&mut self) {
        let d = Self::default();
        self.width = coerce(self.width, d.width, 100.0, 4000.0);
        self.height = coerce(self.height, d.height, 100.0, 4000.0);
        if self.balls.len() > MAX_BALLS {
            log::warn!(
                "Roster has {} balls, keeping the first {}",
                self.balls.len(),
                MAX_BALLS
            );
            self.balls.truncate(MAX_BALLS);
        }
        for ball in &mut self.balls {
            ball.sanitize();
        }
        self.zone.sanitize();
        for template in &mut self.powerups {
            template.sanitize();
        }
        self.settings.sanitize();
    }

    /// Build the editor arena described by this roster
    pub fn build_arena(&self) -> ArenaState {
        let mut arena = ArenaState::new(self.width, self.height, self.seed);
        for config in &self.balls {
            let Some(id) = arena.add_ball() else {
                break;
            };
            if let Some(ball) = arena.ball_mut(id) {
                config.apply_to(ball);
            }
        }
        arena.set_zone(self.zone.clone());
        arena.set_powerups(self.powerups.clone());
        arena
    }

    pub fn into_battle(self) -> Battle {
        let arena = self.build_arena();
        Battle::new(arena, self.settings)
    }

    /// Four-ball showcase used by the headless runner and the page on first load
    pub fn demo() -> Self {
        let plain = |name: &str, color: &str, x: f32, y: f32| BallConfig {
            name: Some(name.to_string()),
            color: Some(color.to_string()),
            x: Some(x),
            y: Some(y),
            ..Default::default()
        };
        let mut tank = plain("Tank", "#60a5fa", 150.0, 150.0);
        tank.hp_type = HpKind::Segmented;
        tank.hp = 6.0;
        tank.speed = 160.0;
        tank.radius = 24.0;

        let mut blade = plain("Blade", "#f87171", 750.0, 150.0);
        blade.weapon_enabled = true;
        blade.weapon = Weapon::Melee(MeleeWeapon {
            damage: 2.0,
            ..Default::default()
        });

        let mut gunner = plain("Gunner", "#facc15", 150.0, 450.0);
        gunner.weapon_enabled = true;
        gunner.weapon = Weapon::Ranged(RangedWeapon {
            proj_homing_range: 150.0,
            proj_turn: 3.0,
            ..Default::default()
        });

        let mut medic = plain("Medic", "#a78bfa", 750.0, 450.0);
        medic.regen = 2.0;

        Self {
            seed: 42,
            balls: vec![tank, blade, gunner, medic],
            zone: ZoneConfig {
                enabled: true,
                delay: 15.0,
                duration: 30.0,
                dps: 8.0,
                ..Default::default()
            },
            powerups: vec![PowerupTemplate {
                name: "Medkit".to_string(),
                hp_change: 25.0,
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}
