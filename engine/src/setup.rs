// ═══════════════════════════════════════════════════════════════════════
// Game setup - creates initial GameState for N players
// ═══════════════════════════════════════════════════════════════════════

use crate::buildings::{BASIC_BUILDINGS, NEUTRAL_BUILDINGS, PRESTIGE_BUILDINGS, STONE_BUILDINGS, WOOD_BUILDINGS};
use crate::types::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::ops::RangeInclusive;

pub const ROAD_LENGTH: usize = 30;
pub const STARTING_WORKERS: u32 = 6;
pub const STARTING_HOUSES: u32 = 20;
pub const STARTING_BAILIFF: usize = 5;

/// Deniers by seat: the first player starts poorest.
fn starting_deniers(seat: usize) -> u32 {
    match seat {
        0 => 5,
        1 | 2 => 6,
        _ => 7,
    }
}

/// Table sizes the game supports.
pub const PLAYER_COUNTS: RangeInclusive<u8> = 2..=5;

/// Create the initial game state for a given number of players (2–5).
/// Seed controls color assignment and the neutral building order.
pub fn create_initial_state(player_count: u8, seed: u64) -> GameState {
    assert!(PLAYER_COUNTS.contains(&player_count), "Player count must be 2–5");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut colors = PlayerColor::ALL.to_vec();
    colors.shuffle(&mut rng);

    let players: Vec<Player> = colors
        .into_iter()
        .take(player_count as usize)
        .enumerate()
        .map(|(seat, color)| Player {
            color,
            resources: Resources { food: 2, wood: 1, ..Resources::ZERO },
            deniers: starting_deniers(seat),
            score: 0,
            workers: Pool { total: STARTING_WORKERS, placed: 0 },
            houses: Pool { total: STARTING_HOUSES, placed: 0 },
            favors: FavorLevels::default(),
            passed: false,
            pass_order: None,
            inn_occupant: false,
            turn_order: seat,
        })
        .collect();

    // Road: shuffled neutrals, then the fixed basics, then empty lots
    let mut neutrals = NEUTRAL_BUILDINGS.to_vec();
    neutrals.shuffle(&mut rng);

    let mut road: Vec<Slot> = neutrals
        .into_iter()
        .chain(BASIC_BUILDINGS)
        .map(|id| Slot { building: Some(id), house: None, worker: None })
        .collect();
    road.resize(ROAD_LENGTH, Slot::default());

    let stock = BuildingStock {
        wood: WOOD_BUILDINGS.to_vec(),
        stone: STONE_BUILDINGS.to_vec(),
        prestige: PRESTIGE_BUILDINGS.to_vec(),
    };

    let mut state = GameState {
        turn: 1,
        phase: Phase::Income,
        players,
        current_player_index: 0,
        road,
        castle: Castle::new(),
        special: SpecialSlots::default(),
        stock,
        bailiff_position: STARTING_BAILIFF,
        provost_position: STARTING_BAILIFF,
        passing_scale: vec![None; player_count as usize],
        favor_columns_available: 2,
        activation_index: None,
        provost_round: None,
        castle_round: None,
        delayed_transformations: Vec::new(),
        pending: None,
        game_over: false,
        seed,
        log: Vec::new(),
    };

    let order: Vec<String> = state.players.iter().map(|p| p.color.to_string()).collect();
    state.log_line(format!("Game started with {player_count} players: {}", order.join(", ")));
    tracing::debug!(seed, player_count, "initial state created");
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_5_player_game() {
        let state = create_initial_state(5, 42);
        assert_eq!(state.players.len(), 5);
        assert_eq!(state.turn, 1);
        assert_eq!(state.phase, Phase::Income);
        assert_eq!(state.passing_scale.len(), 5);

        let deniers: Vec<u32> = state.players.iter().map(|p| p.deniers).collect();
        assert_eq!(deniers, vec![5, 6, 6, 7, 7]);

        for (seat, p) in state.players.iter().enumerate() {
            assert_eq!(p.turn_order, seat);
            assert_eq!(p.resources, Resources { food: 2, wood: 1, ..Resources::ZERO });
            assert_eq!(p.workers, Pool { total: 6, placed: 0 });
            assert_eq!(p.houses, Pool { total: 20, placed: 0 });
        }
    }

    #[test]
    fn test_road_layout() {
        let state = create_initial_state(3, 7);
        assert_eq!(state.road.len(), ROAD_LENGTH);
        for slot in &state.road[..6] {
            let id = slot.building.unwrap();
            assert!(NEUTRAL_BUILDINGS.contains(&id));
        }
        let basics: Vec<_> = state.road[6..9].iter().map(|s| s.building.unwrap()).collect();
        assert_eq!(basics, BASIC_BUILDINGS.to_vec());
        assert!(state.road[9..].iter().all(|s| s.building.is_none()));
        assert_eq!(state.bailiff_position, 5);
        assert_eq!(state.provost_position, 5);
        assert_eq!(state.favor_columns_available, 2);
    }

    #[test]
    fn test_distinct_colors() {
        let state = create_initial_state(5, 99);
        let mut colors: Vec<_> = state.players.iter().map(|p| p.color).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), 5);
    }

    #[test]
    fn test_deterministic_seed() {
        let s1 = create_initial_state(4, 123);
        let s2 = create_initial_state(4, 123);
        assert_eq!(s1, s2);
    }

    #[test]
    #[should_panic]
    fn test_rejects_six_players() {
        create_initial_state(6, 1);
    }
}
