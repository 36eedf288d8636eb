// ═══════════════════════════════════════════════════════════════════════
// Activation phase - walk the road up to the provost, run each building
// ═══════════════════════════════════════════════════════════════════════

use crate::buildings::{building, BuildingDef, Converter, ConverterTier, Effect, Payment, Reward};
use crate::castle;
use crate::error::Rejection;
use crate::favors::{self, GrantRequest};
use crate::types::*;

/// VP for paying the lawyer.
pub const LAWYER_VP: u32 = 2;

/// What happens after a resolved activation step.
enum Outcome {
    /// Ask the same worker again with a new step.
    Continue(ActivationStep),
    /// Worker goes home.
    Release,
    /// Worker goes home; a different owner may collect a bonus.
    ReleaseWithBonus,
    /// Worker goes home after constructing something worth this many favors.
    Built(u8),
}

// ── Walk ───────────────────────────────────────────────────────────────

pub(crate) fn begin(g: &mut GameState) -> Result<(), Rejection> {
    g.phase = Phase::Activation;
    g.activation_index = None;
    tracing::debug!(turn = g.turn, provost = g.provost_position, "activation phase begins");
    g.log_line("Activating buildings");
    advance(g)
}

/// Continue from the slot after the last activated one.
pub(crate) fn advance(g: &mut GameState) -> Result<(), Rejection> {
    let start = g.activation_index.map_or(0, |i| i + 1);
    let end = g.provost_position.min(g.road.len().saturating_sub(1));

    for index in start..=end {
        let Some(worker) = g.road[index].worker else {
            continue;
        };
        g.activation_index = Some(index);
        let Some(id) = g.road[index].building else {
            vacate_slot(g, index)?;
            continue;
        };
        let def = building(id);

        match def.effect {
            None => vacate_slot(g, index)?,
            Some(Effect::Gain(gain)) => {
                g.player_mut(worker)?.resources.add(&gain);
                g.log_line(format!("{worker} activates {}: +{gain}", def.name));
                if release_with_owner_bonus(g, index, worker)? {
                    return Ok(());
                }
            }
            Some(effect) => {
                let step = opening_step(effect);
                g.pending = Some(PendingInteraction::Activation(ActivationPrompt {
                    road_index: index,
                    worker,
                    building: id,
                    step,
                }));
                return Ok(());
            }
        }
    }

    g.activation_index = None;
    castle::begin(g)
}

fn opening_step(effect: Effect) -> ActivationStep {
    match effect {
        Effect::Gain(_) | Effect::Choice(_) => ActivationStep::Choice,
        Effect::Sell { .. } => ActivationStep::Sell,
        Effect::Buy { max, .. } => ActivationStep::Buy { remaining: max },
        Effect::Build(_) => ActivationStep::Build,
        Effect::Convert(_) => ActivationStep::Convert,
        Effect::Lawyer => ActivationStep::Lawyer,
    }
}

// ── Options ────────────────────────────────────────────────────────────

/// Every answer `resolve` accepts for `prompt` right now.
pub fn activation_options(state: &GameState, prompt: &ActivationPrompt) -> Vec<ActivationChoice> {
    let Ok(p) = state.player(prompt.worker) else {
        return Vec::new();
    };
    let Some(effect) = building(prompt.building).effect else {
        return Vec::new();
    };

    let mut options: Vec<ActivationChoice> = match (prompt.step, effect) {
        (ActivationStep::Choice, Effect::Choice(bundles)) => {
            (0..bundles.len()).map(ActivationChoice::Bundle).collect()
        }
        (ActivationStep::Sell, Effect::Sell { .. }) => p
            .resources
            .entries()
            .map(|(r, _)| ActivationChoice::Resource(r))
            .collect(),
        (ActivationStep::Buy { .. }, Effect::Buy { cost_per, .. }) if p.deniers >= cost_per => {
            Resource::CUBES.into_iter().map(ActivationChoice::Resource).collect()
        }
        (ActivationStep::Build, Effect::Build(tier)) => buildable(state, prompt.worker, tier, false)
            .into_iter()
            .map(ActivationChoice::Building)
            .collect(),
        (ActivationStep::PrestigeTarget { .. }, _) => residential_slots(state, prompt.worker)
            .into_iter()
            .map(ActivationChoice::Slot)
            .collect(),
        (ActivationStep::Convert, Effect::Convert(converter)) => converter
            .tiers()
            .iter()
            .enumerate()
            .filter(|(_, tier)| can_pay(p, tier.pay))
            .map(|(i, _)| ActivationChoice::Tier(i))
            .collect(),
        (ActivationStep::AlchemistCubes { .. }, _) => Resource::CUBES
            .into_iter()
            .filter(|&r| p.resources.get(r) > 0)
            .map(ActivationChoice::Resource)
            .collect(),
        (ActivationStep::Lawyer, Effect::Lawyer) if can_afford_lawyer(p) => {
            lawyer_targets(state, prompt.worker).into_iter().map(ActivationChoice::Slot).collect()
        }
        _ => Vec::new(),
    };

    if prompt.step.can_skip() {
        options.push(ActivationChoice::Skip);
    }
    options
}

fn can_pay(p: &Player, pay: Payment) -> bool {
    match pay {
        Payment::Deniers(n) => p.deniers >= n,
        Payment::Cloth(n) => p.resources.cloth >= n,
        Payment::Cubes(n) => p.resources.cubes_without_gold() >= n,
    }
}

fn can_afford_lawyer(p: &Player) -> bool {
    p.deniers >= 1 && p.resources.cloth >= 1
}

// ── Resolution ─────────────────────────────────────────────────────────

pub(crate) fn resolve(g: &mut GameState, choice: ActivationChoice) -> Result<(), Rejection> {
    let prompt = match &g.pending {
        Some(PendingInteraction::Activation(p)) => *p,
        Some(other) => return Err(Rejection::WrongPendingInteraction { found: other.kind() }),
        None => return Err(Rejection::NothingToResolve),
    };
    let def = building(prompt.building);
    let effect = def
        .effect
        .ok_or_else(|| Rejection::invalid(format!("{} has no effect", def.name)))?;
    let worker = prompt.worker;

    if choice == ActivationChoice::Skip {
        if !prompt.step.can_skip() {
            return Err(Rejection::invalid(format!("{} must be resolved", def.name)));
        }
        g.log_line(format!("{worker} is done at {}", def.name));
        return release(g, &prompt);
    }

    let outcome = match (prompt.step, effect, choice) {
        (ActivationStep::Choice, Effect::Choice(bundles), ActivationChoice::Bundle(i)) => {
            let bundle = bundles
                .get(i)
                .ok_or_else(|| Rejection::invalid(format!("no bundle {i}")))?;
            g.player_mut(worker)?.resources.add(bundle);
            g.log_line(format!("{worker} activates {}: +{bundle}", def.name));
            Outcome::ReleaseWithBonus
        }

        (ActivationStep::Sell, Effect::Sell { price }, ActivationChoice::Resource(r)) => {
            let p = g.player_mut(worker)?;
            if p.resources.get(r) == 0 {
                return Err(Rejection::InsufficientFunds);
            }
            *p.resources.get_mut(r) -= 1;
            p.deniers += price;
            g.log_line(format!("{worker} sells 1 {r} for {price} deniers"));
            Outcome::Release
        }

        (ActivationStep::Buy { remaining }, Effect::Buy { cost_per, .. }, ActivationChoice::Resource(r)) => {
            if r == Resource::Gold {
                return Err(Rejection::invalid("gold is not for sale"));
            }
            let p = g.player_mut(worker)?;
            if p.deniers < cost_per {
                return Err(Rejection::InsufficientFunds);
            }
            p.deniers -= cost_per;
            *p.resources.get_mut(r) += 1;
            let remaining = remaining.saturating_sub(1);
            let still_solvent = p.deniers >= cost_per;
            g.log_line(format!("{worker} buys 1 {r} for {cost_per}"));
            if remaining > 0 && still_solvent {
                Outcome::Continue(ActivationStep::Buy { remaining })
            } else {
                Outcome::Release
            }
        }

        (ActivationStep::Build, Effect::Build(tier), ActivationChoice::Building(id)) => {
            if !g.stock.tier(tier).contains(&id) {
                return Err(Rejection::invalid(format!("{} is not available", building(id).name)));
            }
            let cost = building(id).cost;
            if !g.player(worker)?.resources.covers(&cost) {
                return Err(Rejection::InsufficientFunds);
            }
            if tier == StockTier::Prestige {
                if residential_slots(g, worker).is_empty() {
                    return Err(Rejection::invalid("no residential to replace"));
                }
                Outcome::Continue(ActivationStep::PrestigeTarget { building: id })
            } else {
                Outcome::Built(construct_on_road(g, worker, id, cost)?)
            }
        }

        (ActivationStep::PrestigeTarget { building: id }, _, ActivationChoice::Slot(index)) => {
            let cost = building(id).cost;
            Outcome::Built(construct_prestige(g, worker, id, index, cost)?)
        }

        (ActivationStep::Convert, Effect::Convert(converter), ActivationChoice::Tier(t)) => {
            let tier = converter
                .tiers()
                .get(t)
                .copied()
                .ok_or_else(|| Rejection::invalid(format!("no tier {t}")))?;
            convert(g, worker, def, converter, tier)?
        }

        (ActivationStep::AlchemistCubes { target, picked, gold }, _, ActivationChoice::Resource(r)) => {
            if r == Resource::Gold {
                return Err(Rejection::invalid("the alchemist wants non-gold cubes"));
            }
            let p = g.player_mut(worker)?;
            if p.resources.get(r) == 0 {
                return Err(Rejection::InsufficientFunds);
            }
            *p.resources.get_mut(r) -= 1;
            let picked = picked + 1;
            if picked >= target || p.resources.cubes_without_gold() == 0 {
                p.resources.gold += gold;
                g.log_line(format!("{worker} turns {picked} cubes into {gold} gold"));
                Outcome::Release
            } else {
                Outcome::Continue(ActivationStep::AlchemistCubes { target, picked, gold })
            }
        }

        (ActivationStep::Lawyer, Effect::Lawyer, ActivationChoice::Slot(index)) => {
            if !lawyer_targets(g, worker).contains(&index) {
                return Err(Rejection::invalid(format!("slot {index} cannot be transformed")));
            }
            let p = g.player_mut(worker)?;
            if !can_afford_lawyer(p) {
                return Err(Rejection::InsufficientFunds);
            }
            p.deniers -= 1;
            p.resources.cloth -= 1;
            p.score += LAWYER_VP;
            g.log_line(format!("{worker} pays the lawyer (+{LAWYER_VP} VP)"));
            transform_or_defer(g, index, worker)?;
            Outcome::Release
        }

        _ => return Err(Rejection::invalid("choice does not fit this activation step")),
    };

    match outcome {
        Outcome::Continue(step) => {
            g.pending = Some(PendingInteraction::Activation(ActivationPrompt { step, ..prompt }));
            Ok(())
        }
        Outcome::Release => release(g, &prompt),
        Outcome::ReleaseWithBonus => {
            g.pending = None;
            if release_with_owner_bonus(g, prompt.road_index, worker)? {
                return Ok(());
            }
            advance(g)
        }
        Outcome::Built(favor_count) => {
            g.pending = None;
            vacate_slot(g, prompt.road_index)?;
            if favor_count > 0 {
                favors::grant(
                    g,
                    vec![GrantRequest { player: worker, count: favor_count }],
                    FavorContinuation::ResumeActivation,
                )
            } else {
                advance(g)
            }
        }
    }
}

fn convert(
    g: &mut GameState,
    worker: PlayerColor,
    def: &BuildingDef,
    converter: Converter,
    tier: ConverterTier,
) -> Result<Outcome, Rejection> {
    let p = g.player_mut(worker)?;
    if !can_pay(p, tier.pay) {
        return Err(Rejection::InsufficientFunds);
    }
    let gold = match tier.gain {
        Reward::Gold(n) => n,
        Reward::Prestige(_) => 0,
    };
    match tier.pay {
        // Cubes are surrendered one at a time
        Payment::Cubes(n) => {
            debug_assert_eq!(converter, Converter::Alchemist);
            return Ok(Outcome::Continue(ActivationStep::AlchemistCubes { target: n, picked: 0, gold }));
        }
        Payment::Deniers(n) => p.deniers -= n,
        Payment::Cloth(n) => p.resources.cloth -= n,
    }
    match tier.gain {
        Reward::Prestige(vp) => p.score += vp,
        Reward::Gold(n) => p.resources.gold += n,
    }
    g.log_line(format!("{worker} uses the {}", def.name));
    Ok(Outcome::Release)
}

/// Close the current prompt: worker home, walk on.
fn release(g: &mut GameState, prompt: &ActivationPrompt) -> Result<(), Rejection> {
    g.pending = None;
    vacate_slot(g, prompt.road_index)?;
    advance(g)
}

/// Vacate the slot and pay any owner bonus. Returns true when the owner
/// has to pick and the walk is suspended.
fn release_with_owner_bonus(g: &mut GameState, index: usize, worker: PlayerColor) -> Result<bool, Rejection> {
    let bonus = g.road[index]
        .house
        .filter(|&owner| owner != worker)
        .zip(g.road[index].building)
        .filter(|(_, id)| !building(*id).owner_bonus.is_empty());
    vacate_slot(g, index)?;

    let Some((owner, id)) = bonus else {
        return Ok(false);
    };
    match building(id).owner_bonus {
        [only] => {
            *g.player_mut(owner)?.resources.get_mut(*only) += 1;
            g.log_line(format!("{owner} collects 1 {only} as owner"));
            Ok(false)
        }
        options => {
            g.pending = Some(PendingInteraction::OwnerBonus { owner, options: options.to_vec(), building: id });
            Ok(true)
        }
    }
}

pub(crate) fn resolve_owner_bonus(g: &mut GameState, resource: Resource) -> Result<(), Rejection> {
    let (owner, options) = match &g.pending {
        Some(PendingInteraction::OwnerBonus { owner, options, .. }) => (*owner, options.clone()),
        Some(other) => return Err(Rejection::WrongPendingInteraction { found: other.kind() }),
        None => return Err(Rejection::NothingToResolve),
    };
    if !options.contains(&resource) {
        return Err(Rejection::invalid(format!("{resource} is not an owner bonus option")));
    }
    *g.player_mut(owner)?.resources.get_mut(resource) += 1;
    g.log_line(format!("{owner} collects 1 {resource} as owner"));
    g.pending = None;
    advance(g)
}

// ── Construction ───────────────────────────────────────────────────────

/// Cost after a one-unit discount: the resource the player is exactly one
/// short of, else the largest component of the cost.
pub fn discounted_cost(cost: &Resources, holdings: &Resources) -> Resources {
    let short = Resource::ALL
        .into_iter()
        .find(|&r| cost.get(r) > holdings.get(r));
    let largest = Resource::ALL
        .into_iter()
        .rev()
        .filter(|&r| cost.get(r) > 0)
        .max_by_key(|&r| cost.get(r));
    let mut discounted = *cost;
    if let Some(r) = short.or(largest) {
        let amount = discounted.get_mut(r);
        *amount = amount.saturating_sub(1);
    }
    discounted
}

/// What `color` would pay for `id`.
pub fn effective_cost(state: &GameState, color: PlayerColor, id: BuildingId, discount: bool) -> Option<Resources> {
    let cost = building(id).cost;
    if !discount {
        return Some(cost);
    }
    state.player(color).ok().map(|p| discounted_cost(&cost, &p.resources))
}

/// Stock buildings of `tier` that `color` can pay for and place.
pub fn buildable(state: &GameState, color: PlayerColor, tier: StockTier, discount: bool) -> Vec<BuildingId> {
    let Ok(p) = state.player(color) else {
        return Vec::new();
    };
    // Prestige buildings reuse the residential's house
    let has_site = match tier {
        StockTier::Prestige => !residential_slots(state, color).is_empty(),
        _ => first_empty_slot(state).is_some() && p.houses.available() > 0,
    };
    if !has_site {
        return Vec::new();
    }
    state
        .stock
        .tier(tier)
        .iter()
        .copied()
        .filter(|&id| {
            effective_cost(state, color, id, discount).is_some_and(|cost| p.resources.covers(&cost))
        })
        .collect()
}

pub fn first_empty_slot(state: &GameState) -> Option<usize> {
    state.road.iter().position(|s| s.building.is_none())
}

/// Residentials owned by `color`: the sites for prestige buildings.
pub fn residential_slots(state: &GameState, color: PlayerColor) -> Vec<usize> {
    state
        .road
        .iter()
        .enumerate()
        .filter(|(_, s)| s.building == Some(BuildingId::Residential) && s.house == Some(color))
        .map(|(i, _)| i)
        .collect()
}

/// Build a wood or stone building on the first empty lot. Returns the
/// favors it grants.
pub(crate) fn construct_on_road(
    g: &mut GameState,
    color: PlayerColor,
    id: BuildingId,
    cost: Resources,
) -> Result<u8, Rejection> {
    let def = building(id);
    let tier = match def.stock_tier() {
        Some(tier @ (StockTier::Wood | StockTier::Stone)) => tier,
        _ => return Err(Rejection::invalid(format!("{} is not built on an empty lot", def.name))),
    };
    if !g.stock.tier(tier).contains(&id) {
        return Err(Rejection::invalid(format!("{} is not available", def.name)));
    }
    let index = first_empty_slot(g).ok_or_else(|| Rejection::invalid("the road is full"))?;
    let p = g.player_mut(color)?;
    if p.houses.available() == 0 {
        return Err(Rejection::invalid(format!("{color} has no houses left")));
    }
    if !p.resources.covers(&cost) {
        return Err(Rejection::InsufficientFunds);
    }
    p.resources.subtract(&cost);
    p.score += def.vp;
    p.houses.placed += 1;
    g.stock.take(tier, id);
    g.road[index] = Slot { building: Some(id), house: Some(color), worker: None };
    g.log_line(format!("{color} builds the {} at slot {index} (+{} VP)", def.name, def.vp));
    Ok(def.favors_on_build)
}

/// Replace one of `color`'s residentials with a prestige building.
pub(crate) fn construct_prestige(
    g: &mut GameState,
    color: PlayerColor,
    id: BuildingId,
    index: usize,
    cost: Resources,
) -> Result<u8, Rejection> {
    let def = building(id);
    if !residential_slots(g, color).contains(&index) {
        return Err(Rejection::invalid(format!("slot {index} is not {color}'s residential")));
    }
    if !g.stock.prestige.contains(&id) {
        return Err(Rejection::invalid(format!("{} is not available", def.name)));
    }
    let p = g.player_mut(color)?;
    if !p.resources.covers(&cost) {
        return Err(Rejection::InsufficientFunds);
    }
    p.resources.subtract(&cost);
    p.score += def.vp;
    g.stock.take(StockTier::Prestige, id);
    g.road[index].building = Some(id);
    g.log_line(format!("{color} raises the {} at slot {index} (+{} VP)", def.name, def.vp));
    Ok(def.favors_on_build)
}

// ── Lawyer ─────────────────────────────────────────────────────────────

/// Slots `color`'s lawyer may turn into a residential: neutral buildings
/// while a house is left, and the player's own wood/stone buildings.
pub fn lawyer_targets(state: &GameState, color: PlayerColor) -> Vec<usize> {
    let has_house = state.player(color).is_ok_and(|p| p.houses.available() > 0);
    state
        .road
        .iter()
        .enumerate()
        .filter(|(i, slot)| {
            let Some(id) = slot.building else {
                return false;
            };
            let def = building(id);
            if !def.transformable || state.delayed_transformations.iter().any(|d| d.target_index == *i) {
                return false;
            }
            match def.tier {
                Tier::Neutral => has_house,
                Tier::Wood | Tier::Stone => slot.house == Some(color),
                _ => false,
            }
        })
        .map(|(i, _)| i)
        .collect()
}

/// Transform now, or once the worker standing there has left.
pub(crate) fn transform_or_defer(g: &mut GameState, index: usize, lawyer: PlayerColor) -> Result<(), Rejection> {
    let Some(old_building) = g.road.get(index).and_then(|s| s.building) else {
        return Err(Rejection::invalid(format!("slot {index} is empty")));
    };
    if g.road[index].worker.is_some() {
        g.delayed_transformations.push(DelayedTransformation { target_index: index, lawyer, old_building });
        g.log_line(format!("{} will become a residential once vacated", building(old_building).name));
        return Ok(());
    }
    transform(g, index, lawyer, old_building)
}

fn transform(g: &mut GameState, index: usize, lawyer: PlayerColor, old_building: BuildingId) -> Result<(), Rejection> {
    let def = building(old_building);
    if def.tier == Tier::Neutral && g.player(lawyer)?.houses.available() == 0 {
        g.log_line(format!("{lawyer} has no house left for the {}", def.name));
        return Ok(());
    }
    if let Some(tier) = def.stock_tier() {
        g.stock.tier_mut(tier).push(old_building);
    }
    let slot = &mut g.road[index];
    slot.building = Some(BuildingId::Residential);
    if def.tier == Tier::Neutral {
        slot.house = Some(lawyer);
        g.player_mut(lawyer)?.houses.placed += 1;
    }
    g.log_line(format!("{lawyer} turns the {} at slot {index} into a residential", def.name));
    Ok(())
}

/// Send the slot's worker home and apply transformations waiting on it.
pub(crate) fn vacate_slot(g: &mut GameState, index: usize) -> Result<(), Rejection> {
    if let Some(color) = g.road.get_mut(index).and_then(|s| s.worker.take()) {
        g.return_worker(color)?;
    }
    let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut g.delayed_transformations)
        .into_iter()
        .partition(|d| d.target_index == index);
    g.delayed_transformations = waiting;
    for d in due {
        transform(g, d.target_index, d.lawyer, d.old_building)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::create_initial_state;

    fn with_worker(id: BuildingId, owner: Option<PlayerColor>) -> (GameState, PlayerColor) {
        let mut g = create_initial_state(2, 17);
        let color = g.players[0].color;
        g.road[9] = Slot { building: Some(id), house: owner, worker: Some(color) };
        g.players[0].workers.placed = 1;
        g.provost_position = 12;
        g.phase = Phase::Activation;
        (g, color)
    }

    #[test]
    fn test_discount_prefers_shortfall() {
        let cost = Resources { gold: 1, stone: 2, ..Resources::ZERO };
        let holdings = Resources { gold: 0, stone: 5, ..Resources::ZERO };
        assert_eq!(discounted_cost(&cost, &holdings), Resources { stone: 2, ..Resources::ZERO });
        let rich = Resources { gold: 3, stone: 5, ..Resources::ZERO };
        assert_eq!(discounted_cost(&cost, &rich), Resources { gold: 1, stone: 1, ..Resources::ZERO });
    }

    #[test]
    fn test_gain_with_single_worker() {
        let (mut g, color) = with_worker(BuildingId::WoodSawmill, None);
        advance(&mut g).unwrap();
        let p = g.player(color).unwrap();
        assert_eq!(p.resources.wood, 1 + 2);
        assert_eq!(p.workers.placed, 0);
        assert_eq!(g.road[9].worker, None);
    }

    #[test]
    fn test_owner_bonus_prompt() {
        let mut g = create_initial_state(2, 17);
        let (a, b) = (g.players[0].color, g.players[1].color);
        g.road[9] = Slot { building: Some(BuildingId::StoneFarm), house: Some(b), worker: Some(a) };
        g.players[0].workers.placed = 1;
        g.phase = Phase::Activation;
        g.provost_position = 12;
        advance(&mut g).unwrap();
        assert_eq!(
            g.pending,
            Some(PendingInteraction::OwnerBonus {
                owner: b,
                options: vec![Resource::Food, Resource::Cloth],
                building: BuildingId::StoneFarm,
            })
        );
        resolve_owner_bonus(&mut g, Resource::Cloth).unwrap();
        assert_eq!(g.player(b).unwrap().resources.cloth, 1);
        assert_eq!(g.player(a).unwrap().resources.food, 2 + 2);
    }

    #[test]
    fn test_choice_cannot_be_skipped() {
        let (mut g, _) = with_worker(BuildingId::NeutralFarm, None);
        advance(&mut g).unwrap();
        assert!(matches!(resolve(&mut g, ActivationChoice::Skip), Err(Rejection::InvalidTarget(_))));
        resolve(&mut g, ActivationChoice::Bundle(1)).unwrap();
        assert_eq!(g.players[0].resources.cloth, 1);
    }

    #[test]
    fn test_buy_represented_until_exhausted() {
        let (mut g, color) = with_worker(BuildingId::WoodPeddler, None);
        g.players[0].deniers = 4;
        advance(&mut g).unwrap();
        resolve(&mut g, ActivationChoice::Resource(Resource::Stone)).unwrap();
        assert!(matches!(
            g.pending,
            Some(PendingInteraction::Activation(ActivationPrompt { step: ActivationStep::Buy { remaining: 1 }, .. }))
        ));
        resolve(&mut g, ActivationChoice::Resource(Resource::Cloth)).unwrap();
        let p = g.player(color).unwrap();
        assert_eq!(p.deniers, 0);
        assert_eq!(p.resources.stone, 1);
        assert_eq!(p.resources.cloth, 1);
        assert!(!matches!(g.pending, Some(PendingInteraction::Activation(_))));
    }

    #[test]
    fn test_alchemist_payment_cannot_be_skipped() {
        let (mut g, color) = with_worker(BuildingId::Alchemist, None);
        g.players[0].resources = Resources { food: 1, wood: 1, stone: 1, cloth: 1, gold: 0 };
        advance(&mut g).unwrap();
        resolve(&mut g, ActivationChoice::Tier(1)).unwrap();
        for r in [Resource::Food, Resource::Wood, Resource::Stone] {
            resolve(&mut g, ActivationChoice::Resource(r)).unwrap();
        }
        assert!(matches!(resolve(&mut g, ActivationChoice::Skip), Err(Rejection::InvalidTarget(_))));
        resolve(&mut g, ActivationChoice::Resource(Resource::Cloth)).unwrap();
        assert_eq!(g.player(color).unwrap().resources.gold, 2);
    }

    #[test]
    fn test_alchemist_short_of_cubes_still_grants_full_gold() {
        let (mut g, color) = with_worker(BuildingId::Alchemist, None);
        g.players[0].resources = Resources { food: 2, wood: 1, stone: 1, cloth: 0, gold: 0 };
        advance(&mut g).unwrap();
        resolve(&mut g, ActivationChoice::Tier(1)).unwrap();
        resolve(&mut g, ActivationChoice::Resource(Resource::Food)).unwrap();

        // Cubes lost between picks: only one left for a four-cube tier
        g.players[0].resources.wood = 0;
        g.players[0].resources.stone = 0;
        resolve(&mut g, ActivationChoice::Resource(Resource::Food)).unwrap();

        let p = g.player(color).unwrap();
        assert_eq!(p.resources.cubes_without_gold(), 0);
        assert_eq!(p.resources.gold, 2);
        assert!(!matches!(g.pending, Some(PendingInteraction::Activation(_))));
    }

    #[test]
    fn test_spent_house_supply_blocks_new_sites() {
        let mut g = create_initial_state(2, 17);
        let color = g.players[0].color;
        g.players[0].resources = Resources { food: 5, wood: 5, stone: 5, cloth: 5, gold: 5 };
        g.players[0].deniers = 5;
        assert!(!buildable(&g, color, StockTier::Wood, false).is_empty());
        assert!(lawyer_targets(&g, color).iter().any(|&i| g.road[i].house.is_none()));

        g.players[0].houses.placed = g.players[0].houses.total;
        assert!(buildable(&g, color, StockTier::Wood, false).is_empty());
        assert!(buildable(&g, color, StockTier::Stone, false).is_empty());
        assert!(lawyer_targets(&g, color).iter().all(|&i| g.road[i].house == Some(color)));

        let id = g.stock.wood[0];
        let cost = building(id).cost;
        assert!(matches!(construct_on_road(&mut g, color, id, cost), Err(Rejection::InvalidTarget(_))));
    }

    #[test]
    fn test_lawyer_on_occupied_neutral_is_deferred() {
        let mut g = create_initial_state(2, 17);
        let (a, b) = (g.players[0].color, g.players[1].color);
        g.road[9] = Slot { building: Some(BuildingId::Lawyer), house: Some(a), worker: Some(a) };
        g.road[11] = Slot { building: Some(BuildingId::NeutralFarm), house: None, worker: Some(b) };
        g.players[0].workers.placed = 1;
        g.players[1].workers.placed = 1;
        g.players[0].resources.cloth = 1;
        g.provost_position = 12;
        g.phase = Phase::Activation;
        g.activation_index = Some(8);

        advance(&mut g).unwrap();
        resolve(&mut g, ActivationChoice::Slot(11)).unwrap();

        // The walk stops at the farm: the transformation waits for b
        assert_eq!(g.road[11].building, Some(BuildingId::NeutralFarm));
        assert_eq!(g.delayed_transformations.len(), 1);
        assert!(!lawyer_targets(&g, a).contains(&11));

        resolve(&mut g, ActivationChoice::Bundle(0)).unwrap();
        assert_eq!(g.road[11].building, Some(BuildingId::Residential));
        assert_eq!(g.road[11].house, Some(a));
        assert_eq!(g.player(b).unwrap().resources.food, 2 + 2);
        assert!(g.delayed_transformations.is_empty());
    }

    #[test]
    fn test_lawyer_returns_own_wood_building_to_stock() {
        let (mut g, color) = with_worker(BuildingId::Lawyer, None);
        g.road[9].house = Some(color);
        g.stock.wood.retain(|&b| b != BuildingId::WoodMarket && b != BuildingId::Lawyer);
        g.road[10] = Slot { building: Some(BuildingId::WoodMarket), house: Some(color), worker: None };
        g.players[0].resources.cloth = 1;
        advance(&mut g).unwrap();
        let before = g.players[0].score;
        resolve(&mut g, ActivationChoice::Slot(10)).unwrap();
        assert!(g.stock.wood.contains(&BuildingId::WoodMarket));
        assert_eq!(g.road[10].building, Some(BuildingId::Residential));
        assert_eq!(g.player(color).unwrap().score, before + LAWYER_VP);
    }

    #[test]
    fn test_carpenter_builds_on_first_empty_lot() {
        let (mut g, color) = with_worker(BuildingId::NeutralCarpenter, None);
        g.players[0].resources = Resources { food: 1, wood: 1, ..Resources::ZERO };
        advance(&mut g).unwrap();
        resolve(&mut g, ActivationChoice::Building(BuildingId::WoodSawmill)).unwrap();
        assert_eq!(g.road[10].building, Some(BuildingId::WoodSawmill));
        assert_eq!(g.road[10].house, Some(color));
        let p = g.player(color).unwrap();
        assert_eq!(p.score, 2);
        assert_eq!(p.houses.placed, 1);
        assert!(!g.stock.wood.contains(&BuildingId::WoodSawmill));
    }
}
