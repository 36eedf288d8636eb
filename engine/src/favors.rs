// ═══════════════════════════════════════════════════════════════════════
// Royal favors - grant queue, track choice, per-track rewards
// ═══════════════════════════════════════════════════════════════════════

use crate::activation::{
    self, buildable, construct_on_road, construct_prestige, effective_cost, lawyer_targets, residential_slots,
    transform_or_defer, LAWYER_VP,
};
use crate::castle;
use crate::error::Rejection;
use crate::special;
use crate::types::*;

/// Highest level on any favor track.
pub const MAX_FAVOR_LEVEL: u8 = 5;

/// One player's entitlement, as requested by the effect that grants it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantRequest {
    pub player: PlayerColor,
    pub count: u8,
}

// ── Queries ────────────────────────────────────────────────────────────

/// Tracks `color` may still advance in this batch: unused so far and
/// either maxed out or unlocked by the favor columns.
pub fn available_favor_tracks(state: &GameState, color: PlayerColor, used: &[FavorTrack]) -> Vec<FavorTrack> {
    let Ok(p) = state.player(color) else {
        return Vec::new();
    };
    FavorTrack::ALL
        .into_iter()
        .filter(|track| !used.contains(track))
        .filter(|&track| {
            let level = p.favors.get(track);
            level >= MAX_FAVOR_LEVEL || level + 1 <= state.favor_columns_available
        })
        .collect()
}

/// Whether a building-track level has anything to act on.
pub fn building_level_enabled(state: &GameState, color: PlayerColor, level: u8) -> bool {
    match level {
        2 => !buildable(state, color, StockTier::Wood, true).is_empty(),
        3 => !buildable(state, color, StockTier::Stone, true).is_empty(),
        4 => {
            state.player(color).is_ok_and(|p| p.resources.cloth >= 1)
                && !lawyer_targets(state, color).is_empty()
        }
        5 => !buildable(state, color, StockTier::Prestige, true).is_empty(),
        _ => false,
    }
}

/// Every pick `resolve_sub_choice` accepts for the queue's sub-choice.
pub fn sub_choice_options(state: &GameState, queue: &FavorQueue) -> Vec<FavorPick> {
    let (Some(sub), Some(grant)) = (queue.sub_choice, queue.current()) else {
        return Vec::new();
    };
    let color = grant.player;
    let Ok(p) = state.player(color) else {
        return Vec::new();
    };

    match sub {
        FavorSubChoice::PrestigeLevel { max_level } | FavorSubChoice::DeniersLevel { max_level } => {
            (1..=max_level).map(FavorPick::Level).collect()
        }
        FavorSubChoice::ResourceLevel { max_level } => (1..=max_level)
            .filter(|&l| l != 4 || p.resources.total() > 0)
            .map(FavorPick::Level)
            .collect(),
        FavorSubChoice::WoodOrStone => {
            vec![FavorPick::Resource(Resource::Wood), FavorPick::Resource(Resource::Stone)]
        }
        FavorSubChoice::SwapGive => p.resources.entries().map(|(r, _)| FavorPick::Resource(r)).collect(),
        FavorSubChoice::SwapTake { .. } => Resource::CUBES.into_iter().map(FavorPick::Resource).collect(),
        FavorSubChoice::BuildingLevel { max_level } => (2..=max_level)
            .filter(|&l| building_level_enabled(state, color, l))
            .map(FavorPick::Level)
            .chain(std::iter::once(FavorPick::Skip))
            .collect(),
        FavorSubChoice::DiscountBuild { tier } => buildable(state, color, tier, true)
            .into_iter()
            .map(FavorPick::Building)
            .chain(std::iter::once(FavorPick::Skip))
            .collect(),
        FavorSubChoice::DiscountPrestigeTarget { .. } => residential_slots(state, color)
            .into_iter()
            .map(FavorPick::Slot)
            .chain(std::iter::once(FavorPick::Skip))
            .collect(),
        FavorSubChoice::FreeLawyer => {
            let targets = if p.resources.cloth >= 1 { lawyer_targets(state, color) } else { Vec::new() };
            targets
                .into_iter()
                .map(FavorPick::Slot)
                .chain(std::iter::once(FavorPick::Skip))
                .collect()
        }
    }
}

// ── Queue ──────────────────────────────────────────────────────────────

/// Start a favor batch. Players with nothing to pick are skipped; when
/// nobody is left the continuation runs immediately.
pub(crate) fn grant(
    g: &mut GameState,
    requests: Vec<GrantRequest>,
    resume: FavorContinuation,
) -> Result<(), Rejection> {
    let grants: Vec<FavorGrant> = requests
        .into_iter()
        .filter(|r| r.count > 0)
        .map(|r| FavorGrant { player: r.player, remaining: r.count, tracks_used: Vec::new() })
        .collect();
    for grant in &grants {
        g.log_line(format!("{} receives {} royal favor(s)", grant.player, grant.remaining));
    }
    settle(g, FavorQueue { grants, index: 0, sub_choice: None, resume })
}

/// Park the queue on the first player who can still pick, or drain it.
fn settle(g: &mut GameState, mut queue: FavorQueue) -> Result<(), Rejection> {
    while let Some(grant) = queue.grants.get_mut(queue.index) {
        if grant.remaining > 0 {
            if !available_favor_tracks(g, grant.player, &grant.tracks_used).is_empty() {
                g.pending = Some(PendingInteraction::Favor(queue));
                return Ok(());
            }
            grant.remaining = 0;
            let player = grant.player;
            g.log_line(format!("{player} has no favor track left to advance"));
        }
        queue.index += 1;
    }
    g.pending = None;
    resume(g, queue.resume)
}

fn resume(g: &mut GameState, continuation: FavorContinuation) -> Result<(), Rejection> {
    match continuation {
        FavorContinuation::ResumeSpecial => special::after_joust(g),
        FavorContinuation::ResumeActivation => activation::advance(g),
        FavorContinuation::AfterCastle => castle::end_turn(g),
        FavorContinuation::AfterCount => castle::finish_turn(g),
    }
}

/// Spend one favor of the current grant and move on.
fn consume(g: &mut GameState, mut queue: FavorQueue) -> Result<(), Rejection> {
    if let Some(grant) = queue.current_mut() {
        grant.remaining = grant.remaining.saturating_sub(1);
    }
    queue.sub_choice = None;
    settle(g, queue)
}

fn pending_queue(g: &GameState, with_sub_choice: bool) -> Result<FavorQueue, Rejection> {
    match &g.pending {
        Some(PendingInteraction::Favor(queue)) if queue.sub_choice.is_some() == with_sub_choice => Ok(queue.clone()),
        Some(other) => Err(Rejection::WrongPendingInteraction { found: other.kind() }),
        None => Err(Rejection::NothingToResolve),
    }
}

// ── Resolvers ──────────────────────────────────────────────────────────

pub(crate) fn resolve_choice(g: &mut GameState, track: FavorTrack) -> Result<(), Rejection> {
    let mut queue = pending_queue(g, false)?;
    let grant = queue.current_mut().ok_or(Rejection::NothingToResolve)?;
    let player = grant.player;
    if !available_favor_tracks(g, player, &grant.tracks_used).contains(&track) {
        return Err(Rejection::invalid(format!("the {track} track is not available")));
    }
    grant.tracks_used.push(track);

    let p = g.player_mut(player)?;
    let level = p.favors.get(track);
    let next = (level + 1).min(MAX_FAVOR_LEVEL);
    *p.favors.get_mut(track) = next;

    let sub_choice = match (track, next) {
        (FavorTrack::Prestige, 1) => {
            p.score += 1;
            None
        }
        (FavorTrack::Prestige, n) => Some(FavorSubChoice::PrestigeLevel { max_level: n }),
        (FavorTrack::Deniers, 1) => {
            p.deniers += 3;
            None
        }
        (FavorTrack::Deniers, n) => Some(FavorSubChoice::DeniersLevel { max_level: n }),
        (FavorTrack::Resources, 1) => {
            p.resources.food += 1;
            None
        }
        (FavorTrack::Resources, n) => Some(FavorSubChoice::ResourceLevel { max_level: n }),
        (FavorTrack::Buildings, 1) => None,
        (FavorTrack::Buildings, n) => Some(FavorSubChoice::BuildingLevel { max_level: n }),
    };
    g.log_line(format!("{player} takes a {track} favor (level {next})"));

    match sub_choice {
        Some(sub) => {
            queue.sub_choice = Some(sub);
            g.pending = Some(PendingInteraction::Favor(queue));
            Ok(())
        }
        None => consume(g, queue),
    }
}

pub(crate) fn resolve_sub_choice(g: &mut GameState, pick: FavorPick) -> Result<(), Rejection> {
    let mut queue = pending_queue(g, true)?;
    let sub = queue.sub_choice.ok_or(Rejection::NothingToResolve)?;
    let player = queue.current().map(|grant| grant.player).ok_or(Rejection::NothingToResolve)?;
    let mut extra_favors = 0;

    let next: Option<FavorSubChoice> = match (sub, pick) {
        (FavorSubChoice::PrestigeLevel { max_level }, FavorPick::Level(l)) if (1..=max_level).contains(&l) => {
            g.player_mut(player)?.score += l as u32;
            g.log_line(format!("{player} gains {l} VP"));
            None
        }

        (FavorSubChoice::DeniersLevel { max_level }, FavorPick::Level(l)) if (1..=max_level).contains(&l) => {
            let amount = l as u32 + 2;
            g.player_mut(player)?.deniers += amount;
            g.log_line(format!("{player} gains {amount} deniers"));
            None
        }

        (FavorSubChoice::ResourceLevel { max_level }, FavorPick::Level(l)) if (1..=max_level).contains(&l) => {
            let p = g.player_mut(player)?;
            match l {
                1 => {
                    p.resources.food += 1;
                    None
                }
                2 => Some(FavorSubChoice::WoodOrStone),
                3 => {
                    p.resources.cloth += 1;
                    None
                }
                4 if p.resources.total() == 0 => return Err(Rejection::InsufficientFunds),
                4 => Some(FavorSubChoice::SwapGive),
                _ => {
                    p.resources.gold += 1;
                    None
                }
            }
        }

        (FavorSubChoice::WoodOrStone, FavorPick::Resource(r @ (Resource::Wood | Resource::Stone))) => {
            *g.player_mut(player)?.resources.get_mut(r) += 1;
            g.log_line(format!("{player} takes 1 {r}"));
            None
        }

        (FavorSubChoice::SwapGive, FavorPick::Resource(r)) => {
            let p = g.player_mut(player)?;
            if p.resources.get(r) == 0 {
                return Err(Rejection::InsufficientFunds);
            }
            *p.resources.get_mut(r) -= 1;
            g.log_line(format!("{player} trades away 1 {r}"));
            Some(FavorSubChoice::SwapTake { picks: 0 })
        }

        (FavorSubChoice::SwapTake { picks }, FavorPick::Resource(r)) if r != Resource::Gold => {
            *g.player_mut(player)?.resources.get_mut(r) += 1;
            g.log_line(format!("{player} takes 1 {r}"));
            if picks + 1 >= 2 {
                None
            } else {
                Some(FavorSubChoice::SwapTake { picks: picks + 1 })
            }
        }

        (FavorSubChoice::BuildingLevel { max_level }, FavorPick::Level(l)) if (2..=max_level).contains(&l) => {
            if !building_level_enabled(g, player, l) {
                return Err(Rejection::invalid(format!("building favor level {l} has nothing to build")));
            }
            Some(match l {
                2 => FavorSubChoice::DiscountBuild { tier: StockTier::Wood },
                3 => FavorSubChoice::DiscountBuild { tier: StockTier::Stone },
                4 => FavorSubChoice::FreeLawyer,
                _ => FavorSubChoice::DiscountBuild { tier: StockTier::Prestige },
            })
        }

        (
            FavorSubChoice::BuildingLevel { .. }
            | FavorSubChoice::DiscountBuild { .. }
            | FavorSubChoice::DiscountPrestigeTarget { .. }
            | FavorSubChoice::FreeLawyer,
            FavorPick::Skip,
        ) => {
            g.log_line(format!("{player} lets the building favor go"));
            None
        }

        (FavorSubChoice::DiscountBuild { tier }, FavorPick::Building(id)) => {
            if !g.stock.tier(tier).contains(&id) {
                return Err(Rejection::invalid(format!("{id:?} is not in the {tier} stock")));
            }
            if !buildable(g, player, tier, true).contains(&id) {
                return Err(Rejection::InsufficientFunds);
            }
            if tier == StockTier::Prestige {
                Some(FavorSubChoice::DiscountPrestigeTarget { building: id })
            } else {
                let cost = effective_cost(g, player, id, true).ok_or(Rejection::UnknownPlayer(player))?;
                extra_favors = construct_on_road(g, player, id, cost)?;
                None
            }
        }

        (FavorSubChoice::DiscountPrestigeTarget { building }, FavorPick::Slot(index)) => {
            let cost = effective_cost(g, player, building, true).ok_or(Rejection::UnknownPlayer(player))?;
            extra_favors = construct_prestige(g, player, building, index, cost)?;
            None
        }

        (FavorSubChoice::FreeLawyer, FavorPick::Slot(index)) => {
            if !lawyer_targets(g, player).contains(&index) {
                return Err(Rejection::invalid(format!("slot {index} cannot be transformed")));
            }
            let p = g.player_mut(player)?;
            if p.resources.cloth == 0 {
                return Err(Rejection::InsufficientFunds);
            }
            p.resources.cloth -= 1;
            p.score += LAWYER_VP;
            transform_or_defer(g, index, player)?;
            None
        }

        _ => return Err(Rejection::invalid("pick does not fit the favor sub-choice")),
    };

    if extra_favors > 0 {
        if let Some(grant) = queue.current_mut() {
            grant.remaining += extra_favors;
        }
        g.log_line(format!("{player} earns {extra_favors} more favor(s)"));
    }

    match next {
        Some(sub) => {
            queue.sub_choice = Some(sub);
            g.pending = Some(PendingInteraction::Favor(queue));
            Ok(())
        }
        None => consume(g, queue),
    }
}
