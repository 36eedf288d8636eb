// ═══════════════════════════════════════════════════════════════════════
// Special buildings - gate, trading post, guild, joust, stables, inn
// ═══════════════════════════════════════════════════════════════════════

use crate::error::Rejection;
use crate::favors::{self, GrantRequest};
use crate::placement::{
    can_place_in_castle, can_place_on_road_slot, can_place_on_special, occupy_special, reward_owner_visit,
};
use crate::provost;
use crate::turn_order::reorder_by_stables;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Deniers paid out by the trading post.
pub const TRADING_POST_DENIERS: u32 = 3;
/// Free provost spaces granted by the merchants' guild.
pub const GUILD_MAX_MOVE: u32 = 3;

/// Where the gate worker may be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateTarget {
    Road(usize),
    Special(SpecialBuilding),
    Castle,
    /// Take the worker back instead.
    Decline,
}

/// Every free destination for the gate worker of `color`.
pub fn gate_targets(state: &GameState, color: PlayerColor) -> Vec<GateTarget> {
    let mut targets: Vec<GateTarget> = (0..state.road.len())
        .filter(|&i| can_place_on_road_slot(state, i))
        .map(GateTarget::Road)
        .collect();
    targets.extend(
        SpecialBuilding::ALL
            .into_iter()
            .filter(|&s| s != SpecialBuilding::Gate && can_place_on_special(state, s, color))
            .map(GateTarget::Special),
    );
    if can_place_in_castle(state, color) {
        targets.push(GateTarget::Castle);
    }
    targets
}

// ── Sequence ───────────────────────────────────────────────────────────

/// Every player has passed: resolve special buildings in fixed order.
pub(crate) fn begin(g: &mut GameState) -> Result<(), Rejection> {
    g.phase = Phase::Special;
    tracing::debug!(turn = g.turn, "special phase begins");
    g.log_line("Special buildings");

    if let Some(color) = g.special.gate {
        if gate_targets(g, color).is_empty() {
            g.special.gate = None;
            g.return_worker(color)?;
            g.log_line(format!("Gate: nowhere to go, {color}'s worker returns"));
        } else {
            g.pending = Some(PendingInteraction::Gate { player: color });
            return Ok(());
        }
    }
    after_gate(g)
}

pub(crate) fn resolve_gate(g: &mut GameState, target: GateTarget) -> Result<(), Rejection> {
    let player = match &g.pending {
        Some(PendingInteraction::Gate { player }) => *player,
        Some(other) => return Err(Rejection::WrongPendingInteraction { found: other.kind() }),
        None => return Err(Rejection::NothingToResolve),
    };

    match target {
        GateTarget::Decline => {
            g.return_worker(player)?;
            g.log_line(format!("Gate: {player} takes the worker back"));
        }
        GateTarget::Road(index) => {
            if !can_place_on_road_slot(g, index) {
                return Err(Rejection::invalid(format!("road slot {index} is not open")));
            }
            g.road[index].worker = Some(player);
            g.log_line(format!("Gate: {player} moves to road slot {index}"));
            reward_owner_visit(g, index, player)?;
        }
        GateTarget::Special(special) => {
            if special == SpecialBuilding::Gate || !can_place_on_special(g, special, player) {
                return Err(Rejection::invalid(format!("{special} is not open")));
            }
            occupy_special(g, special, player);
            g.log_line(format!("Gate: {player} moves to the {special}"));
        }
        GateTarget::Castle => {
            if !can_place_in_castle(g, player) {
                return Err(Rejection::invalid("already a worker in the castle"));
            }
            g.castle.workers.push(player);
            g.log_line(format!("Gate: {player} moves to the castle"));
        }
    }

    g.special.gate = None;
    g.pending = None;
    after_gate(g)
}

fn after_gate(g: &mut GameState) -> Result<(), Rejection> {
    if let Some(color) = g.special.trading_post.take() {
        g.player_mut(color)?.deniers += TRADING_POST_DENIERS;
        g.return_worker(color)?;
        g.log_line(format!("Trading Post: {color} gains {TRADING_POST_DENIERS} deniers"));
    }

    if let Some(color) = g.special.merchants_guild.take() {
        g.return_worker(color)?;
        g.pending = Some(PendingInteraction::Provost {
            player: color,
            kind: ProvostKind::Guild,
            max_delta: GUILD_MAX_MOVE,
        });
        g.log_line(format!("Merchants' Guild: {color} may move the provost"));
        return Ok(());
    }
    after_guild(g)
}

/// Resumes after the guild's provost move (or when nobody used the guild).
pub(crate) fn after_guild(g: &mut GameState) -> Result<(), Rejection> {
    if let Some(color) = g.special.joust_field.take() {
        g.return_worker(color)?;
        let p = g.player_mut(color)?;
        if p.deniers >= 1 && p.resources.cloth >= 1 {
            p.deniers -= 1;
            p.resources.cloth -= 1;
            g.log_line(format!("Joust Field: {color} pays 1 denier + 1 cloth for a favor"));
            return favors::grant(
                g,
                vec![GrantRequest { player: color, count: 1 }],
                FavorContinuation::ResumeSpecial,
            );
        }
        g.log_line(format!("Joust Field: {color} cannot pay"));
    }
    after_joust(g)
}

/// Resumes once the joust favor is spent.
pub(crate) fn after_joust(g: &mut GameState) -> Result<(), Rejection> {
    reorder_by_stables(g);
    let stabled: Vec<PlayerColor> = g.special.stables.iter().flatten().copied().collect();
    for color in stabled {
        g.return_worker(color)?;
    }
    g.special.stables = [None; 3];

    if let Some(entering) = g.special.inn_left.take() {
        if let Some(evicted) = g.special.inn_right.take() {
            g.player_mut(evicted)?.inn_occupant = false;
            g.return_worker(evicted)?;
            g.log_line(format!("Inn: {evicted} is pushed out"));
        }
        g.special.inn_right = Some(entering);
        g.player_mut(entering)?.inn_occupant = true;
        g.log_line(format!("Inn: {entering} takes a room"));
    } else if let Some(resident) = g.special.inn_right {
        g.pending = Some(PendingInteraction::Inn { player: resident });
        return Ok(());
    }

    provost::begin(g)
}

pub(crate) fn resolve_inn(g: &mut GameState, stay: bool) -> Result<(), Rejection> {
    let player = match &g.pending {
        Some(PendingInteraction::Inn { player }) => *player,
        Some(other) => return Err(Rejection::WrongPendingInteraction { found: other.kind() }),
        None => return Err(Rejection::NothingToResolve),
    };
    if stay {
        g.log_line(format!("Inn: {player} stays"));
    } else {
        g.special.inn_right = None;
        g.player_mut(player)?.inn_occupant = false;
        g.return_worker(player)?;
        g.log_line(format!("Inn: {player} leaves"));
    }
    g.pending = None;
    provost::begin(g)
}
