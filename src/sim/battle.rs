//! Battle flow: Editing -> Loading -> Countdown -> Running -> Ended
//!
//! The loading pause and the countdown are cues on a timeline driven by the
//! same frame deltas as the simulation, so the whole flow can be tested with
//! synthetic `dt` values.

use serde::{Deserialize, Serialize};

use super::events::{BattleOutcome, GameEvent, Winner};
use super::schedule::Timeline;
use super::snapshot::ArenaSnapshot;
use super::state::ArenaState;
use super::tick::step;
use crate::consts::COUNTDOWN_FROM;
use crate::{ArenaError, Settings};

/// Battle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    /// Editor owns the arena
    #[default]
    Editing,
    /// Short pause after Start
    Loading,
    /// 3, 2, 1, GO
    Countdown,
    /// Simulation advancing every frame
    Running,
    /// Winner decided (or battle ended by hand); state frozen
    Ended,
}

/// Presentation cues fired on the orchestration clock
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cue {
    Countdown(u8),
    Go,
}

/// One arena plus the battle state machine driving it
#[derive(Debug, Clone)]
pub struct Battle {
    arena: ArenaState,
    settings: Settings,
    phase: BattlePhase,
    /// Seconds since Start was pressed
    clock: f32,
    cues: Timeline<Cue>,
    countdown: Option<u8>,
    outcome: Option<BattleOutcome>,
}

impl Battle {
    pub fn new(arena: ArenaState, settings: Settings) -> Self {
        Self {
            arena,
            settings,
            phase: BattlePhase::Editing,
            clock: 0.0,
            cues: Timeline::new(),
            countdown: None,
            outcome: None,
        }
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn arena(&self) -> &ArenaState {
        &self.arena
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Result of the last battle, once it has ended
    pub fn outcome(&self) -> Option<&BattleOutcome> {
        self.outcome.as_ref()
    }

    /// Number currently shown by the countdown
    pub fn countdown(&self) -> Option<u8> {
        self.countdown
    }

    /// Mutable access for the editor; refused while a battle owns the arena
    pub fn arena_mut(&mut self) -> Result<&mut ArenaState, ArenaError> {
        match self.phase {
            BattlePhase::Editing => Ok(&mut self.arena),
            phase => Err(ArenaError::NotEditable(phase)),
        }
    }

    /// Replace the tuning; editor only
    pub fn set_settings(&mut self, mut settings: Settings) -> Result<(), ArenaError> {
        if self.phase != BattlePhase::Editing {
            return Err(ArenaError::NotEditable(self.phase));
        }
        settings.sanitize();
        self.settings = settings;
        Ok(())
    }

    /// Start pressed: reset every ball and begin the loading pause
    ///
    /// With fewer than two balls the battle stays in `Editing`.
    pub fn start(&mut self) -> Result<Vec<GameEvent>, ArenaError> {
        if self.phase != BattlePhase::Editing {
            return Err(ArenaError::NotEditable(self.phase));
        }
        if let Err(err) = self.arena.reset_for_battle() {
            log::warn!("Battle not started: {}", err);
            return Err(err);
        }

        self.phase = BattlePhase::Loading;
        self.clock = 0.0;
        self.countdown = None;
        self.outcome = None;
        self.cues.clear();

        let loading = self.settings.loading_delay;
        let tick = self.settings.countdown_tick;
        for (k, value) in (1..=COUNTDOWN_FROM).rev().enumerate() {
            self.cues.schedule(loading + k as f32 * tick, Cue::Countdown(value));
        }
        self.cues.schedule(loading + COUNTDOWN_FROM as f32 * tick, Cue::Go);

        log::info!(
            "Loading battle with {} balls (seed {})",
            self.arena.balls.len(),
            self.arena.seed
        );
        Ok(vec![GameEvent::Loading])
    }

    /// Advance by one frame of real (or synthetic) time
    pub fn advance(&mut self, frame_dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match self.phase {
            BattlePhase::Loading | BattlePhase::Countdown => {
                if frame_dt.is_finite() && frame_dt > 0.0 {
                    self.clock += frame_dt;
                }
                for cue in self.cues.drain_due(self.clock) {
                    self.run_cue(cue, &mut events);
                }
            }
            BattlePhase::Running => {
                step(&mut self.arena, &self.settings, frame_dt, &mut events);
                if self.arena.alive_count() <= 1 {
                    self.finish(false, &mut events);
                }
            }
            BattlePhase::Editing | BattlePhase::Ended => {}
        }
        events
    }

    fn run_cue(&mut self, cue: Cue, events: &mut Vec<GameEvent>) {
        match cue {
            Cue::Countdown(value) => {
                self.phase = BattlePhase::Countdown;
                self.countdown = Some(value);
                events.push(GameEvent::Countdown { value });
            }
            Cue::Go => {
                self.countdown = None;
                self.phase = BattlePhase::Running;
                events.push(GameEvent::Countdown { value: 0 });
                events.push(GameEvent::BattleStarted);
                log::info!("Battle started");
            }
        }
    }

    /// "End Game": stop early, keeping whoever is alive
    ///
    /// Returns no events when the battle is not in progress.
    pub fn end_game(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if matches!(
            self.phase,
            BattlePhase::Loading | BattlePhase::Countdown | BattlePhase::Running
        ) {
            self.finish(true, &mut events);
        }
        events
    }

    /// Enter `Ended` and report the outcome; a second call does nothing
    fn finish(&mut self, forced: bool, events: &mut Vec<GameEvent>) {
        if self.phase == BattlePhase::Ended {
            return;
        }
        self.phase = BattlePhase::Ended;
        self.cues.clear();
        self.countdown = None;

        let mut alive = self.arena.balls.iter().filter(|b| b.is_alive());
        let winner = match (alive.next(), alive.next()) {
            (Some(ball), None) => Some(Winner {
                id: ball.id,
                name: ball.name.clone(),
                appearance: ball.appearance.clone(),
            }),
            _ => None,
        };
        let outcome = BattleOutcome {
            winner,
            survivors: self.arena.alive_count(),
            duration: self.arena.elapsed,
            forced,
        };
        match &outcome.winner {
            Some(w) => log::info!("{} wins after {:.1}s", w.name, outcome.duration),
            None => log::info!("Battle ended with no winner ({} left)", outcome.survivors),
        }
        events.push(GameEvent::BattleEnded {
            outcome: outcome.clone(),
        });
        self.outcome = Some(outcome);
    }

    /// Back to the editor: positions kept, everything at rest
    pub fn exit_to_editor(&mut self) {
        if self.phase == BattlePhase::Editing {
            return;
        }
        self.arena.freeze();
        self.cues.clear();
        self.countdown = None;
        self.outcome = None;
        self.phase = BattlePhase::Editing;
        log::info!("Returned to editor");
    }

    /// Read-only view for the renderer
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot::capture(
            &self.arena,
            self.phase,
            self.countdown,
            self.outcome.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Appearance, Ball};
    use glam::Vec2;

    fn still_ball(name: &str, pos: Vec2, damage: f32) -> Ball {
        let mut b = Ball::new(0, name, Appearance::Color("#abc".into()));
        b.spawn = pos;
        b.speed = 0.0;
        b.damage = damage;
        b
    }

    fn battle_with(balls: Vec<Ball>) -> Battle {
        let mut arena = ArenaState::new(800.0, 600.0, 11);
        for b in balls {
            arena.insert_ball(b);
        }
        Battle::new(arena, Settings::default())
    }

    /// Run frames until the battle is running, returning the events seen
    fn run_to_start(battle: &mut Battle) -> Vec<GameEvent> {
        let mut events = battle.start().unwrap();
        for _ in 0..200 {
            if battle.phase() == BattlePhase::Running {
                break;
            }
            events.extend(battle.advance(0.05));
        }
        assert_eq!(battle.phase(), BattlePhase::Running);
        events
    }

    #[test]
    fn test_single_ball_cannot_start() {
        let mut battle = battle_with(vec![still_ball("Solo", Vec2::new(100.0, 100.0), 10.0)]);
        assert_eq!(
            battle.start(),
            Err(ArenaError::InsufficientEntrants { count: 1 })
        );
        assert_eq!(battle.phase(), BattlePhase::Editing);
        assert!(battle.arena_mut().is_ok());
    }

    #[test]
    fn test_loading_then_countdown_then_running() {
        let mut battle = battle_with(vec![
            still_ball("A", Vec2::new(100.0, 100.0), 10.0),
            still_ball("B", Vec2::new(500.0, 400.0), 10.0),
        ]);
        let events = battle.start().unwrap();
        assert_eq!(events, vec![GameEvent::Loading]);
        assert_eq!(battle.phase(), BattlePhase::Loading);
        assert!(matches!(battle.arena_mut(), Err(ArenaError::NotEditable(BattlePhase::Loading))));

        battle.advance(0.5);
        assert_eq!(battle.phase(), BattlePhase::Loading);
        battle.advance(0.2);
        assert_eq!(battle.phase(), BattlePhase::Countdown);
        assert_eq!(battle.countdown(), Some(3));

        for _ in 0..100 {
            if battle.phase() == BattlePhase::Running {
                break;
            }
            battle.advance(0.1);
        }
        assert_eq!(battle.phase(), BattlePhase::Running);
        assert_eq!(battle.countdown(), None);
    }

    #[test]
    fn test_countdown_sequence_and_no_sim_before_go() {
        let mut battle = battle_with(vec![
            still_ball("A", Vec2::new(100.0, 100.0), 10.0),
            still_ball("B", Vec2::new(500.0, 400.0), 10.0),
        ]);
        let events = run_to_start(&mut battle);
        let counts: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Countdown { value } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![3, 2, 1, 0]);
        assert_eq!(events.first(), Some(&GameEvent::Loading));
        assert_eq!(events.last(), Some(&GameEvent::BattleStarted));
        // Simulation clock untouched by loading and countdown
        assert_eq!(battle.arena().elapsed, 0.0);
    }

    #[test]
    fn test_last_ball_standing_wins() {
        let mut battle = battle_with(vec![
            still_ball("A", Vec2::new(200.0, 200.0), 50.0),
            still_ball("B", Vec2::new(220.0, 200.0), 50.0),
            still_ball("C", Vec2::new(700.0, 500.0), 50.0),
        ]);
        let ids: Vec<u32> = battle.arena().balls.iter().map(|b| b.id).collect();
        run_to_start(&mut battle);

        let mut ended = Vec::new();
        for _ in 0..100 {
            // Keep A and B pressed together
            for (id, x) in [(ids[0], 200.0), (ids[1], 220.0)] {
                if let Some(b) = battle.arena.ball_mut(id) {
                    b.pos = Vec2::new(x, 200.0);
                }
            }
            for event in battle.advance(0.04) {
                if let GameEvent::BattleEnded { outcome } = event {
                    ended.push(outcome);
                }
            }
            if battle.phase() == BattlePhase::Ended {
                break;
            }
        }

        assert_eq!(battle.phase(), BattlePhase::Ended);
        assert_eq!(battle.arena().alive_count(), 1);
        assert_eq!(ended.len(), 1);
        let winner = ended[0].winner.as_ref().unwrap();
        assert_eq!(winner.id, ids[2]);
        assert_eq!(winner.name, "C");
        assert!(!ended[0].forced);
    }

    #[test]
    fn test_end_game_reports_once() {
        let mut battle = battle_with(vec![
            still_ball("A", Vec2::new(100.0, 100.0), 10.0),
            still_ball("B", Vec2::new(500.0, 400.0), 10.0),
        ]);
        run_to_start(&mut battle);
        battle.advance(0.04);

        let first = battle.end_game();
        assert_eq!(first.len(), 1);
        let GameEvent::BattleEnded { outcome } = &first[0] else {
            panic!("expected BattleEnded, got {:?}", first[0]);
        };
        assert!(outcome.forced);
        assert!(outcome.winner.is_none());
        assert_eq!(outcome.survivors, 2);

        assert!(battle.end_game().is_empty());
        assert!(battle.advance(0.04).is_empty());
        assert_eq!(battle.phase(), BattlePhase::Ended);
    }

    #[test]
    fn test_exit_to_editor_keeps_positions_and_stops_balls() {
        let mut a = still_ball("A", Vec2::new(100.0, 100.0), 10.0);
        a.speed = 200.0;
        let mut b = still_ball("B", Vec2::new(500.0, 400.0), 10.0);
        b.speed = 200.0;
        let mut battle = battle_with(vec![a, b]);
        run_to_start(&mut battle);
        for _ in 0..5 {
            battle.advance(0.02);
        }
        let positions: Vec<Vec2> = battle.arena().balls.iter().map(|b| b.pos).collect();
        battle.end_game();
        battle.exit_to_editor();

        assert_eq!(battle.phase(), BattlePhase::Editing);
        assert!(battle.outcome().is_none());
        for (ball, pos) in battle.arena().balls.iter().zip(positions) {
            assert_eq!(ball.vel, Vec2::ZERO);
            assert_eq!(ball.pos, pos);
        }
        assert!(battle.arena_mut().is_ok());
    }
}
