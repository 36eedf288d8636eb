// ═══════════════════════════════════════════════════════════════════════
// Game Engine - public operations and action dispatch
//
// Architecture:
//   The engine is a pure state machine. It never does I/O or calls agents.
//   Every operation borrows a snapshot, works on a private copy and returns
//   the new snapshot, or a `Rejection` with the input left untouched.
//   When a player decision is needed the engine sets `state.pending`; the
//   runner reads it, asks the right agent and feeds the answer back.
//
// Flow:
//   1. `collect_income` opens the turn
//   2. Workers are placed until everyone passes; the special buildings,
//      provost, activation and castle phases then run automatically,
//      stopping at each pending interaction
//   3. Resolving the pending interaction resumes the phase where it stopped
//   4. Repeat until `state.game_over`
// ═══════════════════════════════════════════════════════════════════════

use crate::activation;
use crate::castle;
use crate::error::Rejection;
use crate::favors;
use crate::placement;
use crate::provost;
use crate::special::{self, GateTarget};
use crate::turn_order;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Everything a player can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Collect income and open the workers phase
    CollectIncome,

    /// Place a worker on a road slot
    PlaceOnRoad(usize),

    /// Place a worker on a special building
    PlaceOnSpecial(SpecialBuilding),

    /// Place a worker in the castle
    PlaceInCastle,

    /// Stop placing workers this turn
    Pass,

    /// Redirect the gate worker
    Gate(GateTarget),

    /// Pick a favor track
    FavorTrack(FavorTrack),

    /// Answer a favor sub-choice
    FavorSub(FavorPick),

    /// Move the provost by a signed number of spaces
    MoveProvost(i32),

    /// Answer a building activation prompt
    Activate(ActivationChoice),

    /// Deliver food plus two different cubes to the castle
    CastleBatch(Resource, Resource),

    /// Stop delivering batches
    SkipCastle,

    /// Stay in (true) or leave (false) the inn
    Inn { stay: bool },

    /// Pick the owner bonus resource
    OwnerBonus(Resource),
}

/// Run `step` on a private copy of `state`.
fn transition(
    state: &GameState,
    step: impl FnOnce(&mut GameState) -> Result<(), Rejection>,
) -> Result<GameState, Rejection> {
    if state.game_over {
        return Err(Rejection::GameOver);
    }
    let mut next = state.clone();
    step(&mut next)?;
    Ok(next)
}

/// Phase actions are refused while an interaction is outstanding.
fn no_pending(state: &GameState) -> Result<(), Rejection> {
    match &state.pending {
        Some(p) => Err(Rejection::WrongPendingInteraction { found: p.kind() }),
        None => Ok(()),
    }
}

// ── Phase operations ───────────────────────────────────────────────────

pub fn collect_income(state: &GameState) -> Result<GameState, Rejection> {
    no_pending(state)?;
    transition(state, turn_order::collect_income)
}

pub fn place_worker_on_road(state: &GameState, index: usize) -> Result<GameState, Rejection> {
    no_pending(state)?;
    transition(state, |g| placement::place_on_road(g, index))
}

pub fn place_worker_on_special(state: &GameState, special: SpecialBuilding) -> Result<GameState, Rejection> {
    no_pending(state)?;
    transition(state, |g| placement::place_on_special(g, special))
}

pub fn place_worker_in_castle(state: &GameState) -> Result<GameState, Rejection> {
    no_pending(state)?;
    transition(state, placement::place_in_castle)
}

pub fn pass(state: &GameState) -> Result<GameState, Rejection> {
    no_pending(state)?;
    transition(state, turn_order::pass)
}

// ── Pending interaction resolvers ──────────────────────────────────────

pub fn resolve_gate(state: &GameState, target: GateTarget) -> Result<GameState, Rejection> {
    transition(state, |g| special::resolve_gate(g, target))
}

pub fn resolve_favor_choice(state: &GameState, track: FavorTrack) -> Result<GameState, Rejection> {
    transition(state, |g| favors::resolve_choice(g, track))
}

pub fn resolve_favor_sub_choice(state: &GameState, pick: FavorPick) -> Result<GameState, Rejection> {
    transition(state, |g| favors::resolve_sub_choice(g, pick))
}

pub fn resolve_provost_move(state: &GameState, delta: i32) -> Result<GameState, Rejection> {
    transition(state, |g| provost::resolve_move(g, delta))
}

pub fn resolve_activation(state: &GameState, choice: ActivationChoice) -> Result<GameState, Rejection> {
    transition(state, |g| activation::resolve(g, choice))
}

pub fn resolve_castle_batch(state: &GameState, a: Resource, b: Resource) -> Result<GameState, Rejection> {
    transition(state, |g| castle::resolve_batch(g, a, b))
}

pub fn skip_castle_batch(state: &GameState) -> Result<GameState, Rejection> {
    transition(state, castle::skip_batch)
}

pub fn resolve_inn(state: &GameState, stay: bool) -> Result<GameState, Rejection> {
    transition(state, |g| special::resolve_inn(g, stay))
}

pub fn resolve_owner_bonus(state: &GameState, resource: Resource) -> Result<GameState, Rejection> {
    transition(state, |g| activation::resolve_owner_bonus(g, resource))
}

/// Dispatch an `Action` to its operation.
pub fn apply(state: &GameState, action: Action) -> Result<GameState, Rejection> {
    match action {
        Action::CollectIncome => collect_income(state),
        Action::PlaceOnRoad(index) => place_worker_on_road(state, index),
        Action::PlaceOnSpecial(special) => place_worker_on_special(state, special),
        Action::PlaceInCastle => place_worker_in_castle(state),
        Action::Pass => pass(state),
        Action::Gate(target) => resolve_gate(state, target),
        Action::FavorTrack(track) => resolve_favor_choice(state, track),
        Action::FavorSub(pick) => resolve_favor_sub_choice(state, pick),
        Action::MoveProvost(delta) => resolve_provost_move(state, delta),
        Action::Activate(choice) => resolve_activation(state, choice),
        Action::CastleBatch(a, b) => resolve_castle_batch(state, a, b),
        Action::SkipCastle => skip_castle_batch(state),
        Action::Inn { stay } => resolve_inn(state, stay),
        Action::OwnerBonus(resource) => resolve_owner_bonus(state, resource),
    }
}

// ── Results ────────────────────────────────────────────────────────────

/// Players by score, best first. Ties keep turn order.
pub fn final_standings(state: &GameState) -> Vec<(PlayerColor, u32)> {
    let mut standings: Vec<(PlayerColor, u32)> = state.players.iter().map(|p| (p.color, p.score)).collect();
    standings.sort_by(|a, b| b.1.cmp(&a.1));
    standings
}

/// Everyone sharing the top score. More than one entry is a draw.
pub fn winners(state: &GameState) -> Vec<PlayerColor> {
    let top = state.players.iter().map(|p| p.score).max().unwrap_or(0);
    state.players.iter().filter(|p| p.score == top).map(|p| p.color).collect()
}

/// JSON snapshot of the full state.
pub fn to_json(state: &GameState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}

pub fn from_json(json: &str) -> serde_json::Result<GameState> {
    serde_json::from_str(json)
}
