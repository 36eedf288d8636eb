// ═══════════════════════════════════════════════════════════════════════
// Random Agent - makes all decisions randomly.
// Serves as baseline and for testing game engine stability.
// ═══════════════════════════════════════════════════════════════════════

use crate::agent::Agent;
use caylus_engine::engine::Action;
use caylus_engine::special::GateTarget;
use caylus_engine::types::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub struct RandomAgent {
    color: PlayerColor,
    rng: ChaCha8Rng,
}

impl RandomAgent {
    pub fn new(color: PlayerColor, seed: u64) -> Self {
        RandomAgent {
            color,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform pick; callers guarantee `items` is non-empty.
    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.gen_range(0..items.len())]
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str { "Random" }
    fn color(&self) -> PlayerColor { self.color }

    fn choose_placement(&mut self, _state: &GameState, options: &[Action]) -> Action {
        // Passing at random ends most turns after one worker; keep it rarer
        let placements: Vec<Action> = options.iter().copied().filter(|a| *a != Action::Pass).collect();
        if placements.is_empty() || self.rng.gen_bool(0.15) {
            Action::Pass
        } else {
            self.pick(&placements)
        }
    }

    fn choose_gate(&mut self, _state: &GameState, targets: &[GateTarget]) -> GateTarget {
        self.pick(targets)
    }

    fn choose_favor_track(&mut self, _state: &GameState, tracks: &[FavorTrack]) -> FavorTrack {
        self.pick(tracks)
    }

    fn choose_favor_pick(&mut self, _state: &GameState, picks: &[FavorPick]) -> FavorPick {
        self.pick(picks)
    }

    fn choose_provost_move(&mut self, _state: &GameState, moves: &[i32]) -> i32 {
        self.pick(moves)
    }

    fn choose_activation(
        &mut self,
        _state: &GameState,
        _prompt: &ActivationPrompt,
        choices: &[ActivationChoice],
    ) -> ActivationChoice {
        self.pick(choices)
    }

    fn choose_castle_batch(
        &mut self,
        _state: &GameState,
        batches: &[(Resource, Resource)],
    ) -> Option<(Resource, Resource)> {
        if self.rng.gen_bool(0.2) {
            None
        } else {
            Some(self.pick(batches))
        }
    }

    fn stay_at_inn(&mut self, _state: &GameState) -> bool {
        self.rng.gen_bool(0.5)
    }

    fn choose_owner_bonus(&mut self, _state: &GameState, options: &[Resource]) -> Resource {
        self.pick(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caylus_engine::legal::legal_actions;
    use caylus_engine::setup::create_initial_state;
    use caylus_engine::engine::apply;

    #[test]
    fn test_random_agent_answers_with_a_legal_action() {
        let state = apply(&create_initial_state(3, 4), Action::CollectIncome).unwrap();
        let mut agent = RandomAgent::new(state.players[0].color, 9);
        for _ in 0..20 {
            let options = legal_actions(&state);
            assert!(options.contains(&agent.decide(&state, &options)));
        }
    }
}
