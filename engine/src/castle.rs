// ═══════════════════════════════════════════════════════════════════════
// Castle phase, end of turn, section counting, final scoring
// ═══════════════════════════════════════════════════════════════════════

use crate::error::Rejection;
use crate::favors::{self, GrantRequest};
use crate::types::*;

/// VP lost by a castle worker that contributes nothing.
pub const EMPTY_HANDED_PENALTY: u32 = 2;

/// Resources that can make up the two distinct cubes of a batch.
const BATCH_CUBES: [Resource; 4] = [Resource::Wood, Resource::Stone, Resource::Cloth, Resource::Gold];

/// Outcome of counting a castle section for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionReward {
    Penalty(u32),
    Favors(u8),
    Nothing,
}

pub fn section_reward(section: SectionId, houses: usize) -> SectionReward {
    use SectionReward::*;
    match (section, houses) {
        (SectionId::Dungeon, 0) => Penalty(2),
        (SectionId::Dungeon, 1) => Nothing,
        (SectionId::Dungeon, _) => Favors(1),
        (SectionId::Walls, 0) => Penalty(3),
        (SectionId::Walls, 1) => Nothing,
        (SectionId::Walls, 2) => Favors(1),
        (SectionId::Walls, 3 | 4) => Favors(2),
        (SectionId::Walls, _) => Favors(3),
        (SectionId::Towers, 0) => Penalty(4),
        (SectionId::Towers, 1) => Nothing,
        (SectionId::Towers, 2 | 3) => Favors(1),
        (SectionId::Towers, 4 | 5) => Favors(2),
        (SectionId::Towers, _) => Favors(3),
    }
}

// ── Queries ────────────────────────────────────────────────────────────

/// Distinct resource pairs `color` can offer with one food, while the
/// castle still has room and the player still has a house.
pub fn castle_batch_options(state: &GameState, color: PlayerColor) -> Vec<(Resource, Resource)> {
    let Ok(p) = state.player(color) else {
        return Vec::new();
    };
    if p.resources.food == 0 || p.houses.available() == 0 || state.castle.open_section().is_none() {
        return Vec::new();
    }
    let held: Vec<Resource> = BATCH_CUBES.into_iter().filter(|&r| p.resources.get(r) > 0).collect();
    let mut pairs = Vec::new();
    for (i, &a) in held.iter().enumerate() {
        for &b in &held[i + 1..] {
            pairs.push((a, b));
        }
    }
    pairs
}

/// Final bonus: 3 VP per gold, 1 per 3 other cubes, 1 per 4 deniers.
pub fn end_game_bonus(p: &Player) -> u32 {
    p.resources.gold * 3 + p.resources.cubes_without_gold() / 3 + p.deniers / 4
}

// ── Castle phase ───────────────────────────────────────────────────────

pub(crate) fn begin(g: &mut GameState) -> Result<(), Rejection> {
    g.phase = Phase::Castle;
    tracing::debug!(turn = g.turn, workers = g.castle.workers.len(), "castle phase begins");
    g.log_line(format!("Castle ({})", g.castle.current));
    if g.castle.workers.is_empty() {
        return end_turn(g);
    }
    g.castle_round = Some(CastleRound::default());
    next_worker(g)
}

fn next_worker(g: &mut GameState) -> Result<(), Rejection> {
    loop {
        let Some(index) = g.castle_round.as_ref().map(|r| r.worker_index) else {
            return finish(g);
        };
        let Some(&color) = g.castle.workers.get(index) else {
            return finish(g);
        };
        if !castle_batch_options(g, color).is_empty() {
            g.pending = Some(PendingInteraction::Castle { player: color });
            return Ok(());
        }
        penalize_empty_hand(g, color)?;
        g.return_worker(color)?;
        if let Some(round) = g.castle_round.as_mut() {
            round.worker_index += 1;
        }
    }
}

fn castle_player(g: &GameState) -> Result<PlayerColor, Rejection> {
    match &g.pending {
        Some(PendingInteraction::Castle { player }) => Ok(*player),
        Some(other) => Err(Rejection::WrongPendingInteraction { found: other.kind() }),
        None => Err(Rejection::NothingToResolve),
    }
}

pub(crate) fn resolve_batch(g: &mut GameState, a: Resource, b: Resource) -> Result<(), Rejection> {
    let player = castle_player(g)?;
    if a == b || !BATCH_CUBES.contains(&a) || !BATCH_CUBES.contains(&b) {
        return Err(Rejection::invalid("a batch is food plus two different cubes"));
    }
    let section = g.castle.open_section().ok_or_else(|| Rejection::invalid("the castle is full"))?;
    let p = g.player_mut(player)?;
    if p.houses.available() == 0 {
        return Err(Rejection::invalid(format!("{player} has no houses left")));
    }
    if p.resources.food == 0 || p.resources.get(a) == 0 || p.resources.get(b) == 0 {
        return Err(Rejection::InsufficientFunds);
    }
    p.resources.food -= 1;
    *p.resources.get_mut(a) -= 1;
    *p.resources.get_mut(b) -= 1;
    p.score += section.vp_per_batch();
    p.houses.placed += 1;

    if let Some(lot) = g.castle.section_mut(section).houses.iter_mut().find(|h| h.is_none()) {
        *lot = Some(player);
    }
    if let Some(round) = g.castle_round.as_mut() {
        *round.batches.entry(player).or_insert(0) += 1;
    }
    g.log_line(format!(
        "{player} builds in the {section} with food, {a} and {b} (+{} VP)",
        section.vp_per_batch()
    ));

    if castle_batch_options(g, player).is_empty() {
        done_with_worker(g, player)
    } else {
        Ok(())
    }
}

pub(crate) fn skip_batch(g: &mut GameState) -> Result<(), Rejection> {
    let player = castle_player(g)?;
    let batches = g
        .castle_round
        .as_ref()
        .and_then(|r| r.batches.get(&player).copied())
        .unwrap_or(0);
    if batches == 0 {
        penalize_empty_hand(g, player)?;
    } else {
        g.log_line(format!("{player} stops building"));
    }
    done_with_worker(g, player)
}

fn penalize_empty_hand(g: &mut GameState, color: PlayerColor) -> Result<(), Rejection> {
    if g.castle.open_section().is_none() {
        g.log_line(format!("{color} contributes nothing, but the castle is full"));
        return Ok(());
    }
    if g.player(color)?.houses.available() == 0 {
        g.log_line(format!("{color} contributes nothing, having no houses left"));
        return Ok(());
    }
    g.player_mut(color)?.penalize(EMPTY_HANDED_PENALTY);
    g.log_line(format!("{color} contributes nothing (-{EMPTY_HANDED_PENALTY} VP)"));
    Ok(())
}

fn done_with_worker(g: &mut GameState, color: PlayerColor) -> Result<(), Rejection> {
    g.pending = None;
    g.return_worker(color)?;
    if let Some(round) = g.castle_round.as_mut() {
        round.worker_index += 1;
    }
    next_worker(g)
}

/// Reward the best builder of the phase; ties go to the earlier worker.
fn finish(g: &mut GameState) -> Result<(), Rejection> {
    let round = g.castle_round.take().unwrap_or_default();
    let mut best: Option<(PlayerColor, u32)> = None;
    for &color in &g.castle.workers {
        let built = round.batches.get(&color).copied().unwrap_or(0);
        if built > 0 && best.map_or(true, |(_, most)| built > most) {
            best = Some((color, built));
        }
    }
    g.castle.workers.clear();

    match best {
        Some((color, built)) => {
            g.log_line(format!("{color} is the best castle builder ({built} batches)"));
            favors::grant(g, vec![GrantRequest { player: color, count: 1 }], FavorContinuation::AfterCastle)
        }
        None => end_turn(g),
    }
}

// ── End of turn ────────────────────────────────────────────────────────

/// Move the bailiff, reset the provost, count a section if due.
pub(crate) fn end_turn(g: &mut GameState) -> Result<(), Rejection> {
    g.phase = Phase::EndTurn;
    let last = g.road.len().saturating_sub(1);
    let step = if g.provost_position > g.bailiff_position { 2 } else { 1 };
    g.bailiff_position = (g.bailiff_position + step).min(last);
    g.provost_position = g.bailiff_position;
    tracing::debug!(turn = g.turn, bailiff = g.bailiff_position, "end of turn");
    g.log_line(format!("Bailiff advances to {}", g.bailiff_position));

    let current = g.castle.current;
    let section = g.castle.section(current);
    if section.is_full() || (!section.counted && g.bailiff_position >= current.trigger()) {
        count_section(g, current)
    } else {
        finish_turn(g)
    }
}

fn count_section(g: &mut GameState, section: SectionId) -> Result<(), Rejection> {
    g.log_line(format!("Counting the {section}"));
    let mut requests = Vec::new();
    let colors: Vec<PlayerColor> = g.players.iter().map(|p| p.color).collect();
    for color in colors {
        let houses = g.castle.section(section).houses_of(color);
        match section_reward(section, houses) {
            SectionReward::Penalty(vp) => {
                g.player_mut(color)?.penalize(vp);
                g.log_line(format!("{color} has no house in the {section} (-{vp} VP)"));
            }
            SectionReward::Favors(count) => requests.push(GrantRequest { player: color, count }),
            SectionReward::Nothing => {}
        }
    }

    g.castle.section_mut(section).counted = true;
    if let Some(next) = section.next() {
        g.castle.current = next;
        g.favor_columns_available = match next {
            SectionId::Walls => 4,
            _ => 5,
        };
        g.log_line(format!("The {next} open; favor column {} unlocked", g.favor_columns_available));
    }
    favors::grant(g, requests, FavorContinuation::AfterCount)
}

/// Close the turn: either start the next income phase or score the game.
pub(crate) fn finish_turn(g: &mut GameState) -> Result<(), Rejection> {
    g.delayed_transformations.clear();
    g.activation_index = None;
    g.provost_round = None;
    g.castle_round = None;

    if g.castle.towers.counted {
        return final_scoring(g);
    }

    g.turn += 1;
    g.phase = Phase::Income;
    g.current_player_index = 0;
    g.passing_scale = vec![None; g.players.len()];
    for p in g.players.iter_mut() {
        p.passed = false;
        p.pass_order = None;
    }
    g.log_line(format!("Turn {} begins", g.turn));
    Ok(())
}

fn final_scoring(g: &mut GameState) -> Result<(), Rejection> {
    g.game_over = true;
    g.phase = Phase::EndTurn;
    let bonuses: Vec<(PlayerColor, u32)> = g.players.iter().map(|p| (p.color, end_game_bonus(p))).collect();
    for (color, bonus) in bonuses {
        g.player_mut(color)?.score += bonus;
        g.log_line(format!("{color} scores {bonus} VP from leftovers"));
    }
    let top = g.players.iter().map(|p| p.score).max().unwrap_or(0);
    let winners: Vec<String> = g
        .players
        .iter()
        .filter(|p| p.score == top)
        .map(|p| p.color.to_string())
        .collect();
    tracing::info!(turn = g.turn, top, "game over");
    g.log_line(format!("Game over: {} with {top} VP", winners.join(" and ")));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::create_initial_state;

    fn castle_ready(players: u8) -> GameState {
        let mut g = create_initial_state(players, 2);
        g.phase = Phase::Activation;
        g
    }

    #[test]
    fn test_batch_options_need_two_kinds() {
        let mut g = castle_ready(2);
        let color = g.players[0].color;
        assert!(castle_batch_options(&g, color).is_empty());
        g.players[0].resources.stone = 1;
        assert_eq!(castle_batch_options(&g, color), vec![(Resource::Wood, Resource::Stone)]);
        g.players[0].resources.gold = 1;
        assert_eq!(castle_batch_options(&g, color).len(), 3);
    }

    #[test]
    fn test_no_batches_without_houses() {
        let mut g = castle_ready(2);
        let color = g.players[0].color;
        g.players[0].resources.stone = 1;
        g.players[0].houses.placed = g.players[0].houses.total;
        assert!(castle_batch_options(&g, color).is_empty());

        g.players[0].score = 1;
        g.players[0].workers.placed = 1;
        g.castle.workers.push(color);
        begin(&mut g).unwrap();
        let p = g.player(color).unwrap();
        assert_eq!(p.score, 1);
        assert_eq!(p.houses.placed, p.houses.total);
        assert_eq!(p.workers.placed, 0);
    }

    #[test]
    fn test_empty_handed_worker_penalized() {
        let mut g = castle_ready(2);
        let color = g.players[0].color;
        g.players[0].score = 1;
        g.players[0].workers.placed = 1;
        g.castle.workers.push(color);
        begin(&mut g).unwrap();
        let p = g.player(color).unwrap();
        assert_eq!(p.score, 0);
        assert_eq!(p.workers.placed, 0);
    }

    #[test]
    fn test_best_builder_gets_a_favor() {
        let mut g = castle_ready(2);
        let (a, b) = (g.players[0].color, g.players[1].color);
        for p in g.players.iter_mut() {
            p.resources = Resources { food: 2, wood: 2, stone: 2, ..Resources::ZERO };
            p.workers.placed = 1;
        }
        g.castle.workers = vec![b, a];
        begin(&mut g).unwrap();
        assert_eq!(g.pending, Some(PendingInteraction::Castle { player: b }));
        resolve_batch(&mut g, Resource::Wood, Resource::Stone).unwrap();
        skip_batch(&mut g).unwrap();
        assert_eq!(g.pending, Some(PendingInteraction::Castle { player: a }));
        resolve_batch(&mut g, Resource::Stone, Resource::Wood).unwrap();
        resolve_batch(&mut g, Resource::Wood, Resource::Stone).unwrap();

        assert_eq!(g.player(a).unwrap().score, 10);
        assert_eq!(g.player(b).unwrap().score, 5);
        assert_eq!(g.castle.dungeon.houses_of(a), 2);
        match &g.pending {
            Some(PendingInteraction::Favor(q)) => {
                assert_eq!(q.grants[0].player, a);
                assert_eq!(q.resume, FavorContinuation::AfterCastle);
            }
            other => panic!("expected a favor, got {other:?}"),
        }
    }

    #[test]
    fn test_tie_goes_to_earliest_worker() {
        let mut g = castle_ready(2);
        let (a, b) = (g.players[0].color, g.players[1].color);
        for p in g.players.iter_mut() {
            p.resources = Resources { food: 1, wood: 1, stone: 1, ..Resources::ZERO };
            p.workers.placed = 1;
        }
        g.castle.workers = vec![b, a];
        begin(&mut g).unwrap();
        resolve_batch(&mut g, Resource::Wood, Resource::Stone).unwrap();
        resolve_batch(&mut g, Resource::Wood, Resource::Stone).unwrap();
        match &g.pending {
            Some(PendingInteraction::Favor(q)) => assert_eq!(q.grants[0].player, b),
            other => panic!("expected a favor, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_overflows_into_next_section() {
        let mut g = castle_ready(2);
        let (a, b) = (g.players[0].color, g.players[1].color);
        g.castle.dungeon.houses = vec![Some(b); 6];
        g.players[0].resources = Resources { food: 1, wood: 1, cloth: 1, ..Resources::ZERO };
        g.players[0].workers.placed = 1;
        g.castle.workers = vec![a];
        begin(&mut g).unwrap();
        resolve_batch(&mut g, Resource::Wood, Resource::Cloth).unwrap();
        assert_eq!(g.castle.walls.houses_of(a), 1);
        assert_eq!(g.player(a).unwrap().score, 4);
    }

    #[test]
    fn test_bailiff_moves_two_when_provost_ahead() {
        let mut g = castle_ready(2);
        g.bailiff_position = 5;
        g.provost_position = 8;
        end_turn(&mut g).unwrap();
        assert_eq!(g.bailiff_position, 7);
        assert_eq!(g.provost_position, 7);
        assert_eq!(g.turn, 2);
        assert_eq!(g.phase, Phase::Income);
    }

    #[test]
    fn test_section_rewards() {
        assert_eq!(section_reward(SectionId::Dungeon, 0), SectionReward::Penalty(2));
        assert_eq!(section_reward(SectionId::Dungeon, 1), SectionReward::Nothing);
        assert_eq!(section_reward(SectionId::Walls, 3), SectionReward::Favors(2));
        assert_eq!(section_reward(SectionId::Walls, 5), SectionReward::Favors(3));
        assert_eq!(section_reward(SectionId::Towers, 4), SectionReward::Favors(2));
        assert_eq!(section_reward(SectionId::Towers, 0), SectionReward::Penalty(4));
    }

    #[test]
    fn test_end_game_bonus() {
        let mut g = castle_ready(2);
        let p = &mut g.players[0];
        p.resources = Resources { food: 2, wood: 2, stone: 1, cloth: 2, gold: 2 };
        p.deniers = 9;
        assert_eq!(end_game_bonus(p), 6 + 2 + 2);
    }
}
