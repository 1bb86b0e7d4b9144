//! Engine error taxonomy
//!
//! Every variant is recoverable: an action that fails leaves the session
//! untouched (validation happens before any mutation), and the orchestrator
//! answers with a unicast error instead of a broadcast.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("session not found")]
    SessionNotFound,

    #[error("player not found")]
    PlayerNotFound,

    #[error("player is not eligible for this action")]
    NotEligible,

    #[error("card is not held by this player")]
    InvalidCard,

    #[error("winner has no submission this round")]
    InvalidWinner,

    #[error("card pool is exhausted")]
    PoolExhausted,

    #[error("action is not valid in the current round state")]
    WrongState,
}

impl GameError {
    /// Stable wire code for the `error` event
    pub fn code(&self) -> &'static str {
        match self {
            GameError::SessionNotFound => "session_not_found",
            GameError::PlayerNotFound => "player_not_found",
            GameError::NotEligible => "not_eligible",
            GameError::InvalidCard => "invalid_card",
            GameError::InvalidWinner => "invalid_winner",
            GameError::PoolExhausted => "pool_exhausted",
            GameError::WrongState => "wrong_state",
        }
    }
}
