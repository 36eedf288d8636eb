// ═══════════════════════════════════════════════════════════════════════
// Provost phase - paid provost moves in passing order, then eviction
// ═══════════════════════════════════════════════════════════════════════

use crate::activation;
use crate::error::Rejection;
use crate::special;
use crate::turn_order::passing_order;
use crate::types::*;

/// Furthest a single player may push the provost.
pub const MAX_PROVOST_MOVE: u32 = 3;

pub(crate) fn begin(g: &mut GameState) -> Result<(), Rejection> {
    g.phase = Phase::Provost;
    tracing::debug!(turn = g.turn, provost = g.provost_position, "provost phase begins");
    g.log_line(format!("Provost phase (provost at {})", g.provost_position));
    g.provost_round = Some(ProvostRound { order: passing_order(g), index: 0 });
    offer_next(g)
}

/// Ask the next player in passing order who can afford to move.
fn offer_next(g: &mut GameState) -> Result<(), Rejection> {
    loop {
        let Some(round) = &g.provost_round else {
            return finish(g);
        };
        let Some(&color) = round.order.get(round.index) else {
            return finish(g);
        };
        let max_delta = MAX_PROVOST_MOVE.min(g.player(color)?.deniers);
        if max_delta > 0 {
            g.pending = Some(PendingInteraction::Provost { player: color, kind: ProvostKind::Paid, max_delta });
            return Ok(());
        }
        g.log_line(format!("{color} has no deniers to move the provost"));
        if let Some(round) = g.provost_round.as_mut() {
            round.index += 1;
        }
    }
}

/// Resulting provost position for a move of `delta`, clamped to the road.
pub fn provost_target(state: &GameState, delta: i32) -> usize {
    let last = state.road.len().saturating_sub(1) as i64;
    (state.provost_position as i64 + delta as i64).clamp(0, last) as usize
}

pub(crate) fn resolve_move(g: &mut GameState, delta: i32) -> Result<(), Rejection> {
    let (player, kind, max_delta) = match &g.pending {
        Some(PendingInteraction::Provost { player, kind, max_delta }) => (*player, *kind, *max_delta),
        Some(other) => return Err(Rejection::WrongPendingInteraction { found: other.kind() }),
        None => return Err(Rejection::NothingToResolve),
    };
    if delta.unsigned_abs() > max_delta {
        return Err(Rejection::invalid(format!("provost may move at most {max_delta} spaces")));
    }

    let target = provost_target(g, delta);
    let moved = target.abs_diff(g.provost_position) as u32;
    let cost = match kind {
        ProvostKind::Guild => 0,
        ProvostKind::Paid => moved,
    };
    let p = g.player_mut(player)?;
    if p.deniers < cost {
        return Err(Rejection::InsufficientFunds);
    }
    p.deniers -= cost;
    g.provost_position = target;
    g.pending = None;

    if moved > 0 {
        g.log_line(format!("{player} moves the provost to {target} for {cost}"));
    } else {
        g.log_line(format!("{player} leaves the provost at {target}"));
    }

    match kind {
        ProvostKind::Guild => special::after_guild(g),
        ProvostKind::Paid => {
            if let Some(round) = g.provost_round.as_mut() {
                round.index += 1;
            }
            offer_next(g)
        }
    }
}

/// Workers past the provost go home unused; then activation starts.
fn finish(g: &mut GameState) -> Result<(), Rejection> {
    g.provost_round = None;
    let start = g.provost_position + 1;
    for index in start..g.road.len() {
        if let Some(color) = g.road[index].worker {
            g.log_line(format!("{color}'s worker beyond the provost goes home (slot {index})"));
            activation::vacate_slot(g, index)?;
        }
    }
    activation::begin(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::create_initial_state;

    #[test]
    fn test_move_is_clamped_and_charged_for_actual_distance() {
        let mut g = create_initial_state(2, 8);
        g.provost_position = 28;
        let color = g.players[0].color;
        g.passing_scale = vec![Some(color), Some(g.players[1].color)];
        begin(&mut g).unwrap();
        let before = g.player(color).unwrap().deniers;
        resolve_move(&mut g, 3).unwrap();
        assert_eq!(g.provost_position, 29);
        assert_eq!(g.player(color).unwrap().deniers, before - 1);
    }

    #[test]
    fn test_broke_player_is_skipped() {
        let mut g = create_initial_state(2, 8);
        let (a, b) = (g.players[0].color, g.players[1].color);
        g.passing_scale = vec![Some(a), Some(b)];
        g.players[0].deniers = 0;
        begin(&mut g).unwrap();
        assert_eq!(
            g.pending,
            Some(PendingInteraction::Provost { player: b, kind: ProvostKind::Paid, max_delta: 3 })
        );
    }

    #[test]
    fn test_move_beyond_allowance_rejected() {
        let mut g = create_initial_state(2, 8);
        g.players.iter_mut().for_each(|p| p.deniers = 2);
        begin(&mut g).unwrap();
        assert!(matches!(resolve_move(&mut g, -3), Err(Rejection::InvalidTarget(_))));
    }

    #[test]
    fn test_workers_beyond_provost_evicted() {
        let mut g = create_initial_state(2, 8);
        let a = g.players[0].color;
        g.players.iter_mut().for_each(|p| p.deniers = 0);
        g.road[8].worker = Some(a);
        g.players[0].workers.placed = 1;
        g.provost_position = 5;
        begin(&mut g).unwrap();
        assert_eq!(g.road[8].worker, None);
        assert_eq!(g.player(a).unwrap().workers.placed, 0);
    }
}
