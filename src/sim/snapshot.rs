//! Read-only frame view for renderers and the outcome screen
//!
//! Built from the arena after each frame; holds copies only, so drawing can
//! never feed back into the simulation.

use serde::Serialize;

use super::battle::BattlePhase;
use super::events::BattleOutcome;
use super::state::{Appearance, ArenaState, Ball, Weapon};
use super::weapon::melee_tip;
use super::zone::ZonePhase;
use crate::sim::health::HpKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WeaponView {
    Melee { angle: f32, tip_x: f32, tip_y: f32, width: f32 },
    Ranged { lock_range: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallView {
    pub id: u32,
    pub name: String,
    pub appearance: Appearance,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub hp_type: HpKind,
    pub hp: f32,
    pub hp_max: f32,
    pub defeated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon: Option<WeaponView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectileView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerupView {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneView {
    pub phase: ZonePhase,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArenaSnapshot {
    pub phase: BattlePhase,
    pub width: f32,
    pub height: f32,
    pub elapsed: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u8>,
    pub balls: Vec<BallView>,
    pub projectiles: Vec<ProjectileView>,
    pub powerups: Vec<PowerupView>,
    /// Present only while the zone is drawn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<BattleOutcome>,
}

impl ArenaSnapshot {
    pub fn capture(
        state: &ArenaState,
        phase: BattlePhase,
        countdown: Option<u8>,
        outcome: Option<&BattleOutcome>,
    ) -> Self {
        let bounds = state.arena_bounds();

        let powerups = state
            .powerups
            .instances
            .iter()
            .map(|inst| {
                let template = state.powerups.templates.get(inst.template_id as usize);
                PowerupView {
                    id: inst.id,
                    name: template.map(|t| t.name.clone()).unwrap_or_default(),
                    color: template.map(|t| t.color.clone()).unwrap_or_default(),
                    x: inst.pos.x,
                    y: inst.pos.y,
                    radius: inst.radius,
                }
            })
            .collect();

        let zone = (state.zone.phase != ZonePhase::Inactive).then(|| {
            let center = state.zone.center(&bounds);
            ZoneView {
                phase: state.zone.phase,
                x: center.x,
                y: center.y,
                radius: state.zone.radius_at(state.elapsed, &bounds),
            }
        });

        Self {
            phase,
            width: state.width,
            height: state.height,
            elapsed: state.elapsed,
            countdown,
            balls: state.balls.iter().map(ball_view).collect(),
            projectiles: state
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    x: p.pos.x,
                    y: p.pos.y,
                    radius: p.radius,
                })
                .collect(),
            powerups,
            zone,
            outcome: outcome.cloned(),
        }
    }
}

fn ball_view(ball: &Ball) -> BallView {
    let weapon = if ball.weapon_enabled {
        match &ball.weapon {
            Weapon::None => None,
            Weapon::Melee(melee) => {
                let tip = melee_tip(ball, melee);
                Some(WeaponView::Melee {
                    angle: melee.angle,
                    tip_x: tip.x,
                    tip_y: tip.y,
                    width: melee.width,
                })
            }
            Weapon::Ranged(ranged) => Some(WeaponView::Ranged {
                lock_range: ranged.lock_range,
            }),
        }
    } else {
        None
    };
    BallView {
        id: ball.id,
        name: ball.name.clone(),
        appearance: ball.appearance.clone(),
        x: ball.pos.x,
        y: ball.pos.y,
        radius: ball.radius,
        hp_type: ball.health.kind(),
        hp: ball.health.current(),
        hp_max: ball.health.max(),
        defeated: ball.defeated,
        weapon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::MeleeWeapon;
    use crate::sim::zone::ZoneConfig;
    use glam::Vec2;

    #[test]
    fn test_capture_copies_entities() {
        let mut state = ArenaState::new(400.0, 300.0, 3);
        let id = state.add_ball().unwrap();
        {
            let ball = state.ball_mut(id).unwrap();
            ball.pos = Vec2::new(50.0, 60.0);
            ball.weapon = Weapon::Melee(MeleeWeapon::default());
            ball.weapon_enabled = true;
        }
        state.add_ball();

        let snap = ArenaSnapshot::capture(&state, BattlePhase::Editing, None, None);
        assert_eq!(snap.balls.len(), 2);
        let view = &snap.balls[0];
        assert_eq!((view.x, view.y), (50.0, 60.0));
        assert_eq!(view.hp, 100.0);
        match view.weapon {
            Some(WeaponView::Melee { tip_x, .. }) => {
                assert!((tip_x - (50.0 + 18.0 + 26.0)).abs() < 1e-3)
            }
            ref other => panic!("unexpected weapon view {:?}", other),
        }
        assert!(snap.balls[1].weapon.is_none());
        assert!(snap.zone.is_none());
    }

    #[test]
    fn test_zone_visible_once_active() {
        let mut state = ArenaState::new(400.0, 300.0, 3);
        state.set_zone(ZoneConfig {
            enabled: true,
            ..Default::default()
        });
        state.zone.update(0.0);
        let snap = ArenaSnapshot::capture(&state, BattlePhase::Running, None, None);
        let zone = snap.zone.unwrap();
        assert_eq!(zone.radius, 150.0);
        assert_eq!((zone.x, zone.y), (200.0, 150.0));
    }

    #[test]
    fn test_serializes_to_json() {
        let mut state = ArenaState::new(400.0, 300.0, 3);
        state.add_ball();
        let snap = ArenaSnapshot::capture(&state, BattlePhase::Countdown, Some(2), None);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "countdown");
        assert_eq!(json["countdown"], 2);
        assert_eq!(json["balls"][0]["hp_type"], "normal");
        assert!(json.get("outcome").is_none());
    }
}
