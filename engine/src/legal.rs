// ═══════════════════════════════════════════════════════════════════════
// Legal actions - who decides next and what they may submit
// ═══════════════════════════════════════════════════════════════════════

use crate::activation::activation_options;
use crate::castle::castle_batch_options;
use crate::engine::Action;
use crate::favors::{available_favor_tracks, sub_choice_options};
use crate::placement::{can_place_in_castle, can_place_on_road_slot, can_place_on_special, road_cost};
use crate::special::{gate_targets, GateTarget};
use crate::turn_order::placement_cost;
use crate::types::*;

/// Player expected to submit the next action, if any.
pub fn acting_player(state: &GameState) -> Option<PlayerColor> {
    if state.game_over {
        return None;
    }
    if let Some(pending) = &state.pending {
        return pending.player();
    }
    match state.phase {
        Phase::Income => state.players.first().map(|p| p.color),
        Phase::Workers => state.current_player().filter(|p| !p.passed).map(|p| p.color),
        _ => None,
    }
}

/// Every action `apply` accepts in this state. Empty once the game is over.
pub fn legal_actions(state: &GameState) -> Vec<Action> {
    if state.game_over {
        return Vec::new();
    }
    match &state.pending {
        Some(pending) => pending_actions(state, pending),
        None => match state.phase {
            Phase::Income => vec![Action::CollectIncome],
            Phase::Workers => placement_actions(state),
            _ => Vec::new(),
        },
    }
}

fn placement_actions(state: &GameState) -> Vec<Action> {
    let Some(p) = state.current_player().filter(|p| !p.passed) else {
        return Vec::new();
    };
    let mut actions = Vec::new();

    if p.workers.available() > 0 {
        for index in 0..state.road.len() {
            if can_place_on_road_slot(state, index) && p.deniers >= road_cost(state, p, index) {
                actions.push(Action::PlaceOnRoad(index));
            }
        }
        let cost = placement_cost(state, p, false);
        if p.deniers >= cost {
            for special in SpecialBuilding::ALL {
                if can_place_on_special(state, special, p.color) {
                    actions.push(Action::PlaceOnSpecial(special));
                }
            }
            if can_place_in_castle(state, p.color) {
                actions.push(Action::PlaceInCastle);
            }
        }
    }

    actions.push(Action::Pass);
    actions
}

fn pending_actions(state: &GameState, pending: &PendingInteraction) -> Vec<Action> {
    match pending {
        PendingInteraction::Gate { player } => gate_targets(state, *player)
            .into_iter()
            .chain(std::iter::once(GateTarget::Decline))
            .map(Action::Gate)
            .collect(),

        PendingInteraction::OwnerBonus { options, .. } => {
            options.iter().copied().map(Action::OwnerBonus).collect()
        }

        PendingInteraction::Inn { .. } => vec![Action::Inn { stay: true }, Action::Inn { stay: false }],

        PendingInteraction::Favor(queue) if queue.sub_choice.is_some() => sub_choice_options(state, queue)
            .into_iter()
            .map(Action::FavorSub)
            .collect(),

        PendingInteraction::Favor(queue) => match queue.current() {
            Some(grant) => available_favor_tracks(state, grant.player, &grant.tracks_used)
                .into_iter()
                .map(Action::FavorTrack)
                .collect(),
            None => Vec::new(),
        },

        PendingInteraction::Provost { max_delta, .. } => {
            let reach = *max_delta as i32;
            (-reach..=reach).map(Action::MoveProvost).collect()
        }

        PendingInteraction::Activation(prompt) => activation_options(state, prompt)
            .into_iter()
            .map(Action::Activate)
            .collect(),

        PendingInteraction::Castle { player } => castle_batch_options(state, *player)
            .into_iter()
            .map(|(a, b)| Action::CastleBatch(a, b))
            .chain(std::iter::once(Action::SkipCastle))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::apply;
    use crate::setup::create_initial_state;

    #[test]
    fn test_income_is_the_only_opening_action() {
        let state = create_initial_state(3, 5);
        assert_eq!(legal_actions(&state), vec![Action::CollectIncome]);
        assert_eq!(acting_player(&state), Some(state.players[0].color));
    }

    #[test]
    fn test_every_opening_placement_is_accepted() {
        let state = apply(&create_initial_state(4, 5), Action::CollectIncome).unwrap();
        let actions = legal_actions(&state);
        assert!(actions.contains(&Action::Pass));
        assert!(actions.contains(&Action::PlaceInCastle));
        for action in actions {
            assert!(apply(&state, action).is_ok(), "{action:?} rejected");
        }
    }

    #[test]
    fn test_broke_player_can_only_pass() {
        let mut state = apply(&create_initial_state(2, 5), Action::CollectIncome).unwrap();
        state.players[0].deniers = 0;
        assert_eq!(legal_actions(&state), vec![Action::Pass]);
    }
}
