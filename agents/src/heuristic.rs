// ═══════════════════════════════════════════════════════════════════════
// Heuristic Agent - makes decisions using simple greedy heuristics.
// Significantly stronger than RandomAgent.
// ═══════════════════════════════════════════════════════════════════════

use crate::agent::Agent;
use caylus_engine::activation::{buildable, lawyer_targets};
use caylus_engine::buildings::{building, Effect, Payment};
use caylus_engine::castle::castle_batch_options;
use caylus_engine::engine::Action;
use caylus_engine::placement::road_cost;
use caylus_engine::special::GateTarget;
use caylus_engine::turn_order::placement_cost;
use caylus_engine::types::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Slots this far past the bailiff are likely to be cut by the provost.
const SAFE_REACH: usize = 2;

pub struct HeuristicAgent {
    color: PlayerColor,
    rng: ChaCha8Rng,
}

/// Rough worth of one unit of each resource, in deniers.
fn resource_value(r: Resource) -> i32 {
    match r {
        Resource::Food => 2,
        Resource::Wood => 2,
        Resource::Stone => 3,
        Resource::Cloth => 3,
        Resource::Gold => 6,
    }
}

fn bundle_value(bundle: &Resources) -> i32 {
    bundle.entries().map(|(r, n)| resource_value(r) * n as i32).sum()
}

impl HeuristicAgent {
    pub fn new(color: PlayerColor, seed: u64) -> Self {
        HeuristicAgent {
            color,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn me<'a>(&self, state: &'a GameState) -> Option<&'a Player> {
        state.player(self.color).ok()
    }

    /// What a worker on road slot `index` would earn, before paying.
    fn slot_value(&self, state: &GameState, index: usize) -> i32 {
        let Some(me) = self.me(state) else { return 0 };
        let Some(id) = state.road.get(index).and_then(|s| s.building) else {
            return -10;
        };

        let value = match building(id).effect {
            None => -10,
            Some(Effect::Gain(bundle)) => bundle_value(&bundle),
            Some(Effect::Choice(bundles)) => bundles.iter().map(bundle_value).max().unwrap_or(0),
            Some(Effect::Sell { price }) => {
                if me.resources.cubes_without_gold() > 0 { price as i32 } else { -10 }
            }
            Some(Effect::Buy { cost_per, .. }) => {
                if me.deniers >= cost_per + 2 { 3 } else { -10 }
            }
            Some(Effect::Build(tier)) => {
                let options = buildable(state, self.color, tier, false);
                match options.iter().map(|&b| building(b).vp).max() {
                    Some(vp) => 4 + vp as i32,
                    None => -10,
                }
            }
            Some(Effect::Convert(converter)) => {
                let affordable = converter.tiers().iter().any(|t| match t.pay {
                    Payment::Deniers(n) => me.deniers >= n + 2,
                    Payment::Cloth(n) => me.resources.cloth >= n,
                    Payment::Cubes(n) => me.resources.cubes_without_gold() >= n,
                });
                if affordable { 6 } else { -10 }
            }
            Some(Effect::Lawyer) => -5,
        };

        let past_bailiff = index.saturating_sub(state.bailiff_position + SAFE_REACH) as i32;
        value - past_bailiff
    }

    fn castle_value(&self, state: &GameState) -> i32 {
        let batches = castle_batch_options(state, self.color).len() as i32;
        if batches == 0 { -10 } else { 6 + batches }
    }

    fn special_value(&self, state: &GameState, special: SpecialBuilding) -> i32 {
        let Some(me) = self.me(state) else { return 0 };
        match special {
            SpecialBuilding::TradingPost => 3,
            SpecialBuilding::JoustField => {
                if me.deniers >= 3 && me.resources.cloth >= 1 { 5 } else { -10 }
            }
            SpecialBuilding::Stables => if me.turn_order > 0 { 2 } else { -5 },
            SpecialBuilding::Inn => if me.inn_occupant { -5 } else { 2 },
            SpecialBuilding::Gate => 1,
            SpecialBuilding::MerchantsGuild => 0,
        }
    }

    fn placement_value(&self, state: &GameState, action: Action) -> i32 {
        let Some(me) = self.me(state) else { return 0 };
        match action {
            Action::PlaceOnRoad(index) => self.slot_value(state, index) - road_cost(state, me, index) as i32,
            Action::PlaceOnSpecial(special) => {
                self.special_value(state, special) - placement_cost(state, me, false) as i32
            }
            Action::PlaceInCastle => self.castle_value(state) - placement_cost(state, me, false) as i32,
            _ => 0,
        }
    }

    /// Net swing in activated workers (mine minus theirs) if the provost
    /// ends on `target`.
    fn provost_swing(&self, state: &GameState, target: usize) -> i32 {
        state
            .road
            .iter()
            .take(target + 1)
            .filter_map(|s| s.worker)
            .map(|c| if c == self.color { 1 } else { -1 })
            .sum()
    }
}

impl Agent for HeuristicAgent {
    fn name(&self) -> &str { "Heuristic" }
    fn color(&self) -> PlayerColor { self.color }

    fn choose_placement(&mut self, state: &GameState, options: &[Action]) -> Action {
        let mut best = Action::Pass;
        let mut best_value = 0;
        for &action in options {
            let value = self.placement_value(state, action);
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }

    fn choose_gate(&mut self, state: &GameState, targets: &[GateTarget]) -> GateTarget {
        let value = |t: &GateTarget| match *t {
            GateTarget::Road(i) => self.slot_value(state, i),
            GateTarget::Special(s) => self.special_value(state, s),
            GateTarget::Castle => self.castle_value(state),
            GateTarget::Decline => 0,
        };
        targets.iter().copied().max_by_key(value).unwrap_or(GateTarget::Decline)
    }

    fn choose_favor_track(&mut self, state: &GameState, tracks: &[FavorTrack]) -> FavorTrack {
        let me = self.me(state);
        let preference = [FavorTrack::Prestige, FavorTrack::Resources, FavorTrack::Buildings, FavorTrack::Deniers];
        preference
            .into_iter()
            .filter(|t| tracks.contains(t))
            // Spread favors: lowest track first, preference order on ties
            .min_by_key(|&t| me.map_or(0, |p| p.favors.get(t)))
            .unwrap_or(tracks[0])
    }

    fn choose_favor_pick(&mut self, state: &GameState, picks: &[FavorPick]) -> FavorPick {
        let holdings = self.me(state).map(|p| p.resources).unwrap_or(Resources::ZERO);
        let giving = matches!(
            &state.pending,
            Some(PendingInteraction::Favor(FavorQueue { sub_choice: Some(FavorSubChoice::SwapGive), .. }))
        );

        let value = |p: &FavorPick| -> i32 {
            match *p {
                FavorPick::Level(l) => l as i32 * 10,
                FavorPick::Resource(r) if giving => holdings.get(r) as i32 - resource_value(r),
                FavorPick::Resource(r) => resource_value(r),
                FavorPick::Building(b) => building(b).vp as i32 + 5,
                FavorPick::Slot(_) => 1,
                FavorPick::Skip => 0,
            }
        };
        picks.iter().copied().max_by_key(value).unwrap_or(FavorPick::Skip)
    }

    fn choose_provost_move(&mut self, state: &GameState, moves: &[i32]) -> i32 {
        let last = state.road.len().saturating_sub(1) as i64;
        let here = self.provost_swing(state, state.provost_position);
        let mut best = 0;
        let mut best_value = 0;
        for &delta in moves {
            let target = (state.provost_position as i64 + delta as i64).clamp(0, last) as usize;
            let cost = target.abs_diff(state.provost_position) as i32;
            let value = (self.provost_swing(state, target) - here) * 3 - cost;
            if value > best_value {
                best = delta;
                best_value = value;
            }
        }
        best
    }

    fn choose_activation(
        &mut self,
        state: &GameState,
        prompt: &ActivationPrompt,
        choices: &[ActivationChoice],
    ) -> ActivationChoice {
        let Some(me) = self.me(state) else { return choices[0] };
        let effect = building(prompt.building).effect;

        let value = |c: &ActivationChoice| -> i32 {
            match (*c, prompt.step, effect) {
                (ActivationChoice::Bundle(i), _, Some(Effect::Choice(bundles))) => {
                    bundles.get(i).map_or(0, bundle_value)
                }
                // Sell or spend what we hold most of, never gold
                (ActivationChoice::Resource(Resource::Gold), ActivationStep::Sell, _) => -1,
                (ActivationChoice::Resource(r), ActivationStep::Sell, _)
                | (ActivationChoice::Resource(r), ActivationStep::AlchemistCubes { .. }, _) => {
                    me.resources.get(r) as i32
                }
                (ActivationChoice::Resource(r), ActivationStep::Buy { .. }, _) => {
                    if me.deniers >= 4 { resource_value(r) } else { -1 }
                }
                (ActivationChoice::Building(b), _, _) => building(b).vp as i32 + 1,
                (ActivationChoice::Tier(t), _, _) => t as i32 + 1,
                (ActivationChoice::Slot(_), ActivationStep::Lawyer, _) => -1,
                (ActivationChoice::Slot(_), _, _) => 1,
                _ => 0,
            }
        };

        // Lawyer targets are never worth it for this agent
        if prompt.step == ActivationStep::Lawyer && !lawyer_targets(state, self.color).is_empty() {
            if let Some(skip) = choices.iter().find(|c| **c == ActivationChoice::Skip) {
                return *skip;
            }
        }
        choices.iter().copied().max_by_key(value).unwrap_or(choices[0])
    }

    fn choose_castle_batch(
        &mut self,
        state: &GameState,
        batches: &[(Resource, Resource)],
    ) -> Option<(Resource, Resource)> {
        let holdings = self.me(state)?.resources;
        let mut ranked = batches.to_vec();
        // Spend the most plentiful cubes; keep gold for the final bonus
        ranked.shuffle(&mut self.rng);
        ranked.into_iter().max_by_key(|&(a, b)| {
            let gold_penalty = if a == Resource::Gold || b == Resource::Gold { 10 } else { 0 };
            (holdings.get(a) + holdings.get(b)) as i32 - gold_penalty
        })
    }

    fn stay_at_inn(&mut self, _state: &GameState) -> bool {
        true
    }

    fn choose_owner_bonus(&mut self, state: &GameState, options: &[Resource]) -> Resource {
        let holdings = self.me(state).map(|p| p.resources).unwrap_or(Resources::ZERO);
        options
            .iter()
            .copied()
            .min_by_key(|&r| holdings.get(r))
            .unwrap_or(options[0])
    }
}
