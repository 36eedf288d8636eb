// ═══════════════════════════════════════════════════════════════════════
// Turn order - income, worker cost, passing scale, stables re-ranking
// ═══════════════════════════════════════════════════════════════════════

use crate::buildings::building;
use crate::error::Rejection;
use crate::special;
use crate::types::*;

/// Base income every player collects before the workers phase.
pub const BASE_INCOME: u32 = 2;

// ── Queries ────────────────────────────────────────────────────────────

/// Cost of the next worker: 1 denier plus 1 per player already passed.
pub fn worker_cost(state: &GameState) -> u32 {
    let passed = state.passing_scale.iter().take_while(|s| s.is_some()).count();
    passed as u32 + 1
}

/// Cost for `player` placing on a slot; own buildings and the inn seat
/// always cost a single denier.
pub fn placement_cost(state: &GameState, player: &Player, own_building: bool) -> u32 {
    if own_building || player.inn_occupant {
        1
    } else {
        worker_cost(state)
    }
}

/// Deniers `color` collects in the income phase.
pub fn income_for(state: &GameState, color: PlayerColor) -> u32 {
    let from_buildings: u32 = state
        .road
        .iter()
        .filter(|s| s.house == Some(color))
        .filter_map(|s| s.building)
        .map(|id| building(id).income)
        .sum();
    BASE_INCOME + from_buildings
}

/// Passing order for the provost phase: the scale, then anyone missing.
pub fn passing_order(state: &GameState) -> Vec<PlayerColor> {
    let mut order: Vec<PlayerColor> = state.passing_scale.iter().flatten().copied().collect();
    for p in &state.players {
        if !order.contains(&p.color) {
            order.push(p.color);
        }
    }
    order
}

/// Next player after `from` (exclusive, wrapping) who has not passed.
pub fn next_active_player(state: &GameState, from: usize) -> Option<usize> {
    let n = state.players.len();
    (1..=n)
        .map(|step| (from + step) % n)
        .find(|&i| !state.players[i].passed)
}

// ── Transitions ────────────────────────────────────────────────────────

/// Income phase: pay every player, then open the workers phase.
pub(crate) fn collect_income(g: &mut GameState) -> Result<(), Rejection> {
    if g.phase != Phase::Income {
        return Err(Rejection::WrongPhase { expected: Phase::Income, found: g.phase });
    }

    let incomes: Vec<(PlayerColor, u32)> = g
        .players
        .iter()
        .map(|p| (p.color, income_for(g, p.color)))
        .collect();
    for (color, amount) in incomes {
        g.player_mut(color)?.deniers += amount;
        g.log_line(format!("{color} collects {amount} deniers"));
    }

    g.phase = Phase::Workers;
    g.current_player_index = 0;
    tracing::debug!(turn = g.turn, "workers phase begins");
    g.log_line(format!("Turn {}: place workers", g.turn));
    Ok(())
}

/// Current player passes. The first one to pass gets a denier.
pub(crate) fn pass(g: &mut GameState) -> Result<(), Rejection> {
    let idx = active_worker_player(g)?;
    let color = g.players[idx].color;

    let seat = g
        .passing_scale
        .iter()
        .position(Option::is_none)
        .ok_or_else(|| Rejection::invalid("passing scale is full"))?;
    g.passing_scale[seat] = Some(color);

    let p = &mut g.players[idx];
    p.passed = true;
    p.pass_order = Some(seat);
    if seat == 0 {
        p.deniers += 1;
        g.log_line(format!("{color} passes first (+1 denier)"));
    } else {
        g.log_line(format!("{color} passes"));
    }

    match next_active_player(g, idx) {
        Some(next) => {
            g.current_player_index = next;
            Ok(())
        }
        None => special::begin(g),
    }
}

/// Hand the turn to the next player who has not passed.
pub(crate) fn end_placement(g: &mut GameState) {
    if let Some(next) = next_active_player(g, g.current_player_index) {
        g.current_player_index = next;
    }
}

/// Index of the player allowed to act in the workers phase.
pub(crate) fn active_worker_player(g: &GameState) -> Result<usize, Rejection> {
    if g.phase != Phase::Workers {
        return Err(Rejection::WrongPhase { expected: Phase::Workers, found: g.phase });
    }
    match g.players.get(g.current_player_index) {
        Some(p) if !p.passed => Ok(g.current_player_index),
        _ => Err(Rejection::invalid("current player has already passed")),
    }
}

/// Stables occupants move to the front of the turn order in entry order;
/// everyone else keeps their relative order.
pub(crate) fn reorder_by_stables(g: &mut GameState) {
    let front: Vec<PlayerColor> = g.special.stables.iter().flatten().copied().collect();
    if front.is_empty() {
        return;
    }
    g.players.sort_by_key(|p| match front.iter().position(|&c| c == p.color) {
        Some(rank) => (0, rank),
        None => (1, p.turn_order),
    });
    for (rank, p) in g.players.iter_mut().enumerate() {
        p.turn_order = rank;
    }
    let order: Vec<String> = g.players.iter().map(|p| p.color.to_string()).collect();
    g.log_line(format!("Stables: new turn order {}", order.join(", ")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::create_initial_state;

    #[test]
    fn test_worker_cost_follows_scale() {
        let mut state = create_initial_state(4, 1);
        assert_eq!(worker_cost(&state), 1);
        state.passing_scale[0] = Some(state.players[2].color);
        assert_eq!(worker_cost(&state), 2);
        state.passing_scale[1] = Some(state.players[0].color);
        assert_eq!(worker_cost(&state), 3);
    }

    #[test]
    fn test_inn_and_own_building_cost_one() {
        let mut state = create_initial_state(3, 1);
        state.passing_scale[0] = Some(state.players[1].color);
        state.passing_scale[1] = Some(state.players[2].color);
        let p = state.players[0].clone();
        assert_eq!(placement_cost(&state, &p, false), 3);
        assert_eq!(placement_cost(&state, &p, true), 1);
        let mut innkeeper = p.clone();
        innkeeper.inn_occupant = true;
        assert_eq!(placement_cost(&state, &innkeeper, false), 1);
    }

    #[test]
    fn test_income_counts_residentials_and_prestige() {
        let mut state = create_initial_state(2, 5);
        let color = state.players[0].color;
        assert_eq!(income_for(&state, color), 2);
        state.road[10] = Slot { building: Some(BuildingId::Residential), house: Some(color), worker: None };
        state.road[11] = Slot { building: Some(BuildingId::Residential), house: Some(color), worker: None };
        state.road[12] = Slot { building: Some(BuildingId::Hotel), house: Some(color), worker: None };
        state.road[13] = Slot { building: Some(BuildingId::Library), house: Some(color), worker: None };
        assert_eq!(income_for(&state, color), 2 + 2 + 2 + 1);
    }

    #[test]
    fn test_stables_reorder() {
        let mut state = create_initial_state(4, 3);
        let colors: Vec<_> = state.players.iter().map(|p| p.color).collect();
        state.special.stables = [Some(colors[2]), Some(colors[3]), None];
        reorder_by_stables(&mut state);
        let after: Vec<_> = state.players.iter().map(|p| p.color).collect();
        assert_eq!(after, vec![colors[2], colors[3], colors[0], colors[1]]);
        assert!(state.players.iter().enumerate().all(|(i, p)| p.turn_order == i));
    }
}
