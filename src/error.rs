//! Arena error types
//!
//! The simulation core itself never fails; these errors cover the editor
//! boundary and battle start-up.

use thiserror::Error;

use crate::sim::BattlePhase;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArenaError {
    /// Fewer than two balls when the battle was started
    #[error("need at least 2 balls to start a battle, found {count}")]
    InsufficientEntrants { count: usize },

    /// Roster or settings could not be parsed at all
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An editor action referenced a ball that does not exist
    #[error("no ball with id {0}")]
    UnknownBall(u32),

    /// The editor tried to touch the arena while a battle owns it
    #[error("arena cannot be edited while the battle is {0:?}")]
    NotEditable(BattlePhase),
}

impl From<serde_json::Error> for ArenaError {
    fn from(err: serde_json::Error) -> Self {
        ArenaError::InvalidConfiguration(err.to_string())
    }
}
