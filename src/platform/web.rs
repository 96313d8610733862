//! Browser binding
//!
//! The page owns the canvas, the editor forms and requestAnimationFrame. It
//! talks to the arena through JSON strings: rosters in, snapshots and event
//! batches out.

use wasm_bindgen::prelude::*;

use super::FrameLoop;
use crate::sim::{Battle, GameEvent};
use crate::{ArenaError, Roster};

fn to_js(err: ArenaError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn events_json(events: &[GameEvent]) -> String {
    serde_json::to_string(events).unwrap_or_else(|err| {
        log::error!("Failed to encode events: {}", err);
        "[]".to_string()
    })
}

#[wasm_bindgen]
pub struct WebArena {
    battle: Battle,
    frames: FrameLoop,
}

impl WebArena {
    fn from_roster(roster: Roster) -> WebArena {
        log::info!(
            "Arena {}x{} with {} balls (seed {})",
            roster.width,
            roster.height,
            roster.balls.len(),
            roster.seed
        );
        WebArena {
            battle: roster.into_battle(),
            frames: FrameLoop::new(),
        }
    }
}

#[wasm_bindgen]
impl WebArena {
    /// Build an arena from roster JSON
    #[wasm_bindgen(constructor)]
    pub fn new(roster_json: &str) -> Result<WebArena, JsValue> {
        let roster = Roster::from_json(roster_json).map_err(to_js)?;
        Ok(Self::from_roster(roster))
    }

    /// The built-in showcase roster with a time-based seed
    pub fn demo() -> WebArena {
        let mut roster = Roster::demo();
        roster.seed = js_sys::Date::now() as u64;
        Self::from_roster(roster)
    }

    /// Replace the arena with a new roster (editor only)
    pub fn load_roster(&mut self, roster_json: &str) -> Result<(), JsValue> {
        self.battle.arena_mut().map_err(to_js)?;
        let roster = Roster::from_json(roster_json).map_err(to_js)?;
        *self = Self::from_roster(roster);
        Ok(())
    }

    /// Add a default ball; returns its id, or undefined when the arena is full
    pub fn add_ball(&mut self) -> Result<Option<u32>, JsValue> {
        Ok(self.battle.arena_mut().map_err(to_js)?.add_ball())
    }

    pub fn remove_ball(&mut self, id: u32) -> Result<(), JsValue> {
        self.battle
            .arena_mut()
            .map_err(to_js)?
            .remove_ball(id)
            .map(|_| ())
            .map_err(to_js)
    }

    /// Start pressed; returns the event batch as JSON
    pub fn start(&mut self) -> Result<String, JsValue> {
        let events = self.battle.start().map_err(to_js)?;
        self.frames.restart();
        Ok(events_json(&events))
    }

    /// requestAnimationFrame callback; returns null once the loop has stopped
    pub fn frame(&mut self, now_ms: f64) -> Option<String> {
        self.frames
            .frame(now_ms, &mut self.battle)
            .map(|events| events_json(&events))
    }

    pub fn end_game(&mut self) -> String {
        let events = self.battle.end_game();
        self.frames.stop();
        events_json(&events)
    }

    pub fn exit_to_editor(&mut self) {
        self.frames.stop();
        self.battle.exit_to_editor();
    }

    pub fn is_running(&self) -> bool {
        self.frames.is_running()
    }

    /// Current frame view as JSON
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.battle.snapshot()).unwrap_or_else(|err| {
            log::error!("Failed to encode snapshot: {}", err);
            "{}".to_string()
        })
    }
}
