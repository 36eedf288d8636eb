use caylus_engine::error::Rejection;
use caylus_engine::types::Phase;
use thiserror::Error;

/// Everything that can go wrong while running or recording games.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("game {seed} stuck in {phase} on turn {turn}: nobody can act")]
    Stuck { seed: u64, phase: Phase, turn: u32 },

    #[error("game {seed} exceeded {limit} decisions without finishing (turn {turn})")]
    DecisionLimit { seed: u64, limit: usize, turn: u32 },

    #[error("game {seed}: agent action rejected: {reason}")]
    Rejected { seed: u64, reason: Rejection },

    #[error("games take 2 to 5 players, got {players}")]
    PlayerCount { players: usize },

    #[error("no agents to seat")]
    EmptyRoster,
}
