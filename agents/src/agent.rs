// ═══════════════════════════════════════════════════════════════════════
// Agent Trait - interface that all AI agents must implement
//
// Caylus is a perfect-information game, so agents read the full
// `GameState`. They are also handed the legal actions for the current
// decision and must answer with one of them; `decide` splits that list
// by pending interaction and calls the matching typed method.
// ═══════════════════════════════════════════════════════════════════════

use caylus_engine::engine::Action;
use caylus_engine::special::GateTarget;
use caylus_engine::types::*;

/// Trait that all AI agents must implement.
/// Every typed method receives a non-empty option list.
pub trait Agent: Send {
    /// Human-readable name for this agent (e.g., "Random", "Heuristic").
    fn name(&self) -> &str;

    /// The color this agent is playing.
    fn color(&self) -> PlayerColor;

    /// Pick one of `options`, the legal actions of the current decision.
    fn decide(&mut self, state: &GameState, options: &[Action]) -> Action {
        let fallback = options.first().copied().unwrap_or(Action::Pass);

        let chosen = match &state.pending {
            None => {
                if options.is_empty() {
                    None
                } else {
                    Some(self.choose_placement(state, options))
                }
            }
            Some(PendingInteraction::Gate { .. }) => {
                let targets = typed(options, |a| match a {
                    Action::Gate(t) => Some(*t),
                    _ => None,
                });
                non_empty(&targets).map(|t| Action::Gate(self.choose_gate(state, t)))
            }
            Some(PendingInteraction::Favor(queue)) if queue.sub_choice.is_some() => {
                let picks = typed(options, |a| match a {
                    Action::FavorSub(p) => Some(*p),
                    _ => None,
                });
                non_empty(&picks).map(|p| Action::FavorSub(self.choose_favor_pick(state, p)))
            }
            Some(PendingInteraction::Favor(_)) => {
                let tracks = typed(options, |a| match a {
                    Action::FavorTrack(t) => Some(*t),
                    _ => None,
                });
                non_empty(&tracks).map(|t| Action::FavorTrack(self.choose_favor_track(state, t)))
            }
            Some(PendingInteraction::Provost { .. }) => {
                let moves = typed(options, |a| match a {
                    Action::MoveProvost(d) => Some(*d),
                    _ => None,
                });
                non_empty(&moves).map(|m| Action::MoveProvost(self.choose_provost_move(state, m)))
            }
            Some(PendingInteraction::Activation(prompt)) => {
                let choices = typed(options, |a| match a {
                    Action::Activate(c) => Some(*c),
                    _ => None,
                });
                non_empty(&choices).map(|c| Action::Activate(self.choose_activation(state, prompt, c)))
            }
            Some(PendingInteraction::Castle { .. }) => {
                let batches = typed(options, |a| match a {
                    Action::CastleBatch(x, y) => Some((*x, *y)),
                    _ => None,
                });
                if batches.is_empty() {
                    Some(Action::SkipCastle)
                } else {
                    Some(match self.choose_castle_batch(state, &batches) {
                        Some((x, y)) => Action::CastleBatch(x, y),
                        None => Action::SkipCastle,
                    })
                }
            }
            Some(PendingInteraction::Inn { .. }) => Some(Action::Inn { stay: self.stay_at_inn(state) }),
            Some(PendingInteraction::OwnerBonus { options: bonus, .. }) => {
                non_empty(bonus).map(|r| Action::OwnerBonus(self.choose_owner_bonus(state, r)))
            }
        };

        chosen.unwrap_or(fallback)
    }

    // ── Individual decision methods ────────────────────────────────────

    /// Workers phase: a road slot, special building, the castle, or `Pass`.
    fn choose_placement(&mut self, state: &GameState, options: &[Action]) -> Action;

    /// Where the gate worker goes.
    fn choose_gate(&mut self, state: &GameState, targets: &[GateTarget]) -> GateTarget;

    /// Which favor track to advance.
    fn choose_favor_track(&mut self, state: &GameState, tracks: &[FavorTrack]) -> FavorTrack;

    /// Follow-up answer inside a favor track.
    fn choose_favor_pick(&mut self, state: &GameState, picks: &[FavorPick]) -> FavorPick;

    /// Signed provost move.
    fn choose_provost_move(&mut self, state: &GameState, moves: &[i32]) -> i32;

    /// Answer a building activation prompt.
    fn choose_activation(
        &mut self,
        state: &GameState,
        prompt: &ActivationPrompt,
        choices: &[ActivationChoice],
    ) -> ActivationChoice;

    /// Next castle batch. None = stop building.
    fn choose_castle_batch(
        &mut self,
        state: &GameState,
        batches: &[(Resource, Resource)],
    ) -> Option<(Resource, Resource)>;

    /// Whether the inn resident keeps the room.
    fn stay_at_inn(&mut self, state: &GameState) -> bool;

    /// Resource taken as owner bonus.
    fn choose_owner_bonus(&mut self, state: &GameState, options: &[Resource]) -> Resource;
}

fn typed<T>(options: &[Action], pick: impl Fn(&Action) -> Option<T>) -> Vec<T> {
    options.iter().filter_map(pick).collect()
}

fn non_empty<T>(items: &[T]) -> Option<&[T]> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
