// ═══════════════════════════════════════════════════════════════════════
// Worker placement - road slots, special buildings, castle
// ═══════════════════════════════════════════════════════════════════════

use crate::buildings::building;
use crate::error::Rejection;
use crate::turn_order::{active_worker_player, end_placement, placement_cost};
use crate::types::*;

// ── Predicates ─────────────────────────────────────────────────────────

/// Slot hosts a constructed building a worker may use, and is free.
pub fn can_place_on_road_slot(state: &GameState, index: usize) -> bool {
    match state.road.get(index) {
        Some(Slot { building: Some(id), worker: None, .. }) => building(*id).accepts_workers(),
        _ => false,
    }
}

pub fn can_place_on_special(state: &GameState, special: SpecialBuilding, color: PlayerColor) -> bool {
    let s = &state.special;
    match special {
        SpecialBuilding::Gate => s.gate.is_none(),
        SpecialBuilding::TradingPost => s.trading_post.is_none(),
        SpecialBuilding::MerchantsGuild => s.merchants_guild.is_none(),
        SpecialBuilding::JoustField => s.joust_field.is_none(),
        SpecialBuilding::Stables => {
            !s.stables.contains(&Some(color)) && s.stables.iter().any(Option::is_none)
        }
        SpecialBuilding::Inn => s.inn_left.is_none(),
    }
}

/// One castle worker per player per turn.
pub fn can_place_in_castle(state: &GameState, color: PlayerColor) -> bool {
    !state.castle.workers.contains(&color)
}

/// Deniers `color` would pay to put a worker on road slot `index`.
pub fn road_cost(state: &GameState, player: &Player, index: usize) -> u32 {
    let own = state.road.get(index).and_then(|s| s.house) == Some(player.color);
    placement_cost(state, player, own)
}

// ── Resolvers ──────────────────────────────────────────────────────────

pub(crate) fn place_on_road(g: &mut GameState, index: usize) -> Result<(), Rejection> {
    let idx = active_worker_player(g)?;
    if !can_place_on_road_slot(g, index) {
        return Err(Rejection::invalid(format!("road slot {index} cannot take a worker")));
    }
    let cost = road_cost(g, &g.players[idx], index);
    hire_worker(g, idx, cost)?;

    let color = g.players[idx].color;
    let slot = &mut g.road[index];
    slot.worker = Some(color);
    let name = slot.building.map(|id| building(id).name).unwrap_or("?");
    g.log_line(format!("{color} places a worker on {name} (slot {index}) for {cost}"));
    reward_owner_visit(g, index, color)?;

    end_placement(g);
    Ok(())
}

/// The owner of a road building gains 1 VP when another player's worker lands on it.
pub(crate) fn reward_owner_visit(g: &mut GameState, index: usize, visitor: PlayerColor) -> Result<(), Rejection> {
    if let Some(owner) = g.road[index].house.filter(|&o| o != visitor) {
        g.player_mut(owner)?.score += 1;
        g.log_line(format!("{owner} gains 1 VP from {visitor}'s visit"));
    }
    Ok(())
}

pub(crate) fn place_on_special(g: &mut GameState, special: SpecialBuilding) -> Result<(), Rejection> {
    let idx = active_worker_player(g)?;
    let color = g.players[idx].color;
    if !can_place_on_special(g, special, color) {
        return Err(Rejection::invalid(format!("{special} is not open")));
    }
    let cost = placement_cost(g, &g.players[idx], false);
    hire_worker(g, idx, cost)?;
    occupy_special(g, special, color);
    g.log_line(format!("{color} places a worker on the {special} for {cost}"));
    end_placement(g);
    Ok(())
}

pub(crate) fn place_in_castle(g: &mut GameState) -> Result<(), Rejection> {
    let idx = active_worker_player(g)?;
    let color = g.players[idx].color;
    if !can_place_in_castle(g, color) {
        return Err(Rejection::invalid("already a worker in the castle"));
    }
    let cost = placement_cost(g, &g.players[idx], false);
    hire_worker(g, idx, cost)?;
    g.castle.workers.push(color);
    g.log_line(format!("{color} places a worker in the castle for {cost}"));
    end_placement(g);
    Ok(())
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Pay `cost` and commit one worker, or fail without touching anything.
fn hire_worker(g: &mut GameState, idx: usize, cost: u32) -> Result<(), Rejection> {
    let p = &mut g.players[idx];
    if p.workers.available() == 0 {
        return Err(Rejection::NoWorkersAvailable);
    }
    if p.deniers < cost {
        return Err(Rejection::InsufficientFunds);
    }
    p.deniers -= cost;
    p.workers.placed += 1;
    Ok(())
}

/// Put an already-committed worker on a special slot.
pub(crate) fn occupy_special(g: &mut GameState, special: SpecialBuilding, color: PlayerColor) {
    let s = &mut g.special;
    match special {
        SpecialBuilding::Gate => s.gate = Some(color),
        SpecialBuilding::TradingPost => s.trading_post = Some(color),
        SpecialBuilding::MerchantsGuild => s.merchants_guild = Some(color),
        SpecialBuilding::JoustField => s.joust_field = Some(color),
        SpecialBuilding::Stables => {
            if let Some(seat) = s.stables.iter_mut().find(|seat| seat.is_none()) {
                *seat = Some(color);
            }
        }
        SpecialBuilding::Inn => s.inn_left = Some(color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::create_initial_state;
    use crate::turn_order::collect_income;

    fn workers_phase(players: u8) -> GameState {
        let mut g = create_initial_state(players, 11);
        collect_income(&mut g).unwrap();
        g
    }

    #[test]
    fn test_road_predicate() {
        let mut g = workers_phase(3);
        assert!(can_place_on_road_slot(&g, 0));
        assert!(!can_place_on_road_slot(&g, 20));
        assert!(!can_place_on_road_slot(&g, 99));
        g.road[20] = Slot { building: Some(BuildingId::Statue), house: Some(g.players[0].color), worker: None };
        assert!(!can_place_on_road_slot(&g, 20));
        g.road[0].worker = Some(g.players[1].color);
        assert!(!can_place_on_road_slot(&g, 0));
    }

    #[test]
    fn test_stables_one_per_player() {
        let mut g = workers_phase(4);
        let a = g.players[0].color;
        g.special.stables[0] = Some(a);
        assert!(!can_place_on_special(&g, SpecialBuilding::Stables, a));
        assert!(can_place_on_special(&g, SpecialBuilding::Stables, g.players[1].color));
    }

    #[test]
    fn test_visit_scores_owner() {
        let mut g = workers_phase(2);
        let owner = g.players[1].color;
        g.road[9] = Slot { building: Some(BuildingId::WoodSawmill), house: Some(owner), worker: None };
        place_on_road(&mut g, 9).unwrap();
        assert_eq!(g.player(owner).unwrap().score, 1);
        assert_eq!(g.road[9].worker, Some(g.players[0].color));
        assert_eq!(g.current_player_index, 1);
    }

    #[test]
    fn test_second_castle_worker_rejected() {
        let mut g = workers_phase(2);
        let first = g.players[0].color;
        g.castle.workers.push(first);
        assert!(matches!(place_in_castle(&mut g), Err(Rejection::InvalidTarget(_))));
    }

    #[test]
    fn test_no_workers_left() {
        let mut g = workers_phase(2);
        g.players[0].workers.placed = g.players[0].workers.total;
        assert_eq!(place_on_road(&mut g, 0), Err(Rejection::NoWorkersAvailable));
    }
}
