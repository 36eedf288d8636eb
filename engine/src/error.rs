// ═══════════════════════════════════════════════════════════════════════
// Rejection - why the engine refused an action
// ═══════════════════════════════════════════════════════════════════════

use crate::types::{PendingKind, Phase, PlayerColor};
use thiserror::Error;

/// Every resolver either returns a new state or one of these. The input
/// state is borrowed immutably, so a rejection never leaves a trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("no workers available")]
    NoWorkersAvailable,

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("a {found} interaction is pending")]
    WrongPendingInteraction { found: PendingKind },

    #[error("nothing to resolve")]
    NothingToResolve,

    #[error("wrong phase: expected {expected}, currently {found}")]
    WrongPhase { expected: Phase, found: Phase },

    #[error("the game is over")]
    GameOver,

    #[error("no {0} player in this game")]
    UnknownPlayer(PlayerColor),
}

impl Rejection {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Rejection::InvalidTarget(reason.into())
    }
}
