//! Platform drivers
//!
//! The simulation never reads a clock. `FrameLoop` turns host frame
//! timestamps (requestAnimationFrame on the web) into frame deltas and stops
//! for good once the battle ends. `web` exposes the arena to the page.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::{Battle, BattlePhase, GameEvent};

/// Converts host timestamps into `Battle::advance` calls
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    last_ms: Option<f64>,
    stopped: bool,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    /// Stop the loop; further frames are ignored. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            log::debug!("Frame loop stopped");
        }
    }

    /// Rearm after returning to the editor
    pub fn restart(&mut self) {
        self.stopped = false;
        self.last_ms = None;
    }

    /// Handle one host frame at `now_ms`
    ///
    /// The first frame after (re)start only records the timestamp. Returns
    /// `None` once the loop has stopped.
    pub fn frame(&mut self, now_ms: f64, battle: &mut Battle) -> Option<Vec<GameEvent>> {
        if self.stopped {
            return None;
        }
        let dt = match self.last_ms {
            Some(last) if now_ms.is_finite() => ((now_ms - last) / 1000.0).max(0.0) as f32,
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }

        let events = battle.advance(dt);
        if battle.phase() == BattlePhase::Ended {
            self.stop();
        }
        Some(events)
    }
}

/// Drive a started battle with a fixed synthetic `dt` until it ends
///
/// Returns every event produced, and gives up after `max_frames`.
pub fn run_fixed(battle: &mut Battle, dt: f32, max_frames: usize) -> Vec<GameEvent> {
    let mut frames = FrameLoop::new();
    let mut events = Vec::new();
    let step_ms = f64::from(dt) * 1000.0;
    for frame in 0..=max_frames {
        match frames.frame(frame as f64 * step_ms, battle) {
            Some(batch) => events.extend(batch),
            None => break,
        }
    }
    events
}
