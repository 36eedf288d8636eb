// ═══════════════════════════════════════════════════════════════════════
// Test suite for the Caylus engine
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use crate::buildings::{building, PRESTIGE_BUILDINGS, STONE_BUILDINGS, WOOD_BUILDINGS};
    use crate::castle;
    use crate::engine::*;
    use crate::error::Rejection;
    use crate::legal::{acting_player, legal_actions};
    use crate::setup::create_initial_state;
    use crate::special::GateTarget;
    use crate::types::*;
    use proptest::prelude::*;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const MAX_STEPS: usize = 20_000;

    // ── Helpers ────────────────────────────────────────────────────────

    fn workers_phase(player_count: u8, seed: u64) -> GameState {
        apply(&create_initial_state(player_count, seed), Action::CollectIncome).unwrap()
    }

    /// Everyone still placing passes until the workers phase closes.
    fn pass_all(mut state: GameState) -> GameState {
        while state.phase == Phase::Workers && state.pending.is_none() {
            state = apply(&state, Action::Pass).unwrap();
        }
        state
    }

    /// Run a full game picking uniformly among legal actions, checking
    /// invariants after every step.
    fn play_full_game_random(seed: u64, player_count: u8) -> GameState {
        let mut state = create_initial_state(player_count, seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut steps = 0;

        while !state.game_over {
            steps += 1;
            assert!(steps < MAX_STEPS, "seed {seed}: game did not finish");

            let actions = legal_actions(&state);
            assert!(
                !actions.is_empty(),
                "seed {seed}: no legal action in {} with {:?}",
                state.phase,
                state.pending
            );
            assert!(acting_player(&state).is_some());

            let action = *actions.choose(&mut rng).unwrap();
            let next = match apply(&state, action) {
                Ok(next) => next,
                Err(e) => panic!("seed {seed}: legal action {action:?} rejected: {e}"),
            };
            check_illegal_actions_rejected(&state, &actions);
            check_invariants(&state, &next);
            state = next;
        }
        state
    }

    fn check_invariants(before: &GameState, after: &GameState) {
        check_worker_conservation(after);
        check_building_conservation(after);

        assert!(after.provost_position < after.road.len());
        assert!(after.bailiff_position < after.road.len());
        assert!(after.log.len() <= LOG_CAPACITY);
        for id in [SectionId::Dungeon, SectionId::Walls, SectionId::Towers] {
            assert_eq!(after.castle.section(id).houses.len(), id.capacity());
        }

        for p in &after.players {
            assert!(p.houses.placed <= p.houses.total, "{} placed more houses than it owns", p.color);
        }

        // Stables may reorder players, so match by color
        for new in &after.players {
            let old = before.player(new.color).unwrap();
            for track in FavorTrack::ALL {
                assert!(new.favors.get(track) >= old.favors.get(track), "favor track went down");
                assert!(new.favors.get(track) <= 5);
            }
        }
    }

    fn check_worker_conservation(state: &GameState) {
        let castle_from = state.castle_round.as_ref().map_or(0, |r| r.worker_index);
        for p in &state.players {
            let on_road = state.road.iter().filter(|s| s.worker == Some(p.color)).count();
            let on_special = state.special.workers_of(p.color);
            let in_castle = state
                .castle
                .workers
                .iter()
                .skip(castle_from)
                .filter(|&&c| c == p.color)
                .count();
            assert_eq!(
                p.workers.placed as usize,
                on_road + on_special + in_castle,
                "{} worker count out of balance in {}",
                p.color,
                state.phase
            );
        }
    }

    fn check_building_conservation(state: &GameState) {
        for id in WOOD_BUILDINGS.iter().chain(STONE_BUILDINGS.iter()).chain(PRESTIGE_BUILDINGS.iter()) {
            let in_stock = [&state.stock.wood, &state.stock.stone, &state.stock.prestige]
                .iter()
                .map(|bag| bag.iter().filter(|&&b| b == *id).count())
                .sum::<usize>();
            let on_road = state.road.iter().filter(|s| s.building == Some(*id)).count();
            assert_eq!(in_stock + on_road, 1, "{id:?} is not exactly once in stock or on the road");
        }
    }

    /// A few always-illegal actions: rejected, and the input untouched.
    fn check_illegal_actions_rejected(state: &GameState, legal: &[Action]) {
        let snapshot = state.clone();
        let attempts = [
            Action::PlaceOnRoad(99),
            Action::Pass,
            Action::CollectIncome,
            Action::SkipCastle,
            Action::Inn { stay: true },
            Action::MoveProvost(0),
        ];
        for action in attempts {
            if !legal.contains(&action) {
                assert!(apply(state, action).is_err(), "{action:?} accepted but not listed");
            }
        }
        assert_eq!(*state, snapshot);
    }

    // ═════════════════════════════════════════════════════════════════════
    // SCENARIOS
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_scenario_a_placement_pays_scale_cost() {
        let mut state = workers_phase(4, 1);
        let (b, c) = (state.players[1].color, state.players[2].color);
        state.passing_scale[0] = Some(b);
        state.passing_scale[1] = Some(c);
        state.players[1].passed = true;
        state.players[2].passed = true;
        state.players[0].deniers = 5;

        let next = place_worker_on_road(&state, 0).unwrap();
        assert_eq!(next.players[0].deniers, 2);
        assert_eq!(next.players[0].workers.placed, 1);
        assert_eq!(next.road[0].worker, Some(state.players[0].color));
        // Passed players are skipped
        assert_eq!(next.current_player_index, 3);
    }

    #[test]
    fn test_scenario_b_joust_field_grants_a_favor() {
        let state = workers_phase(3, 2);
        let a = state.players[0].color;
        let mut state = place_worker_on_special(&state, SpecialBuilding::JoustField).unwrap();
        state.players[0].deniers = 1;
        state.players[0].resources.cloth = 1;

        let state = pass_all(state);
        let p = state.player(a).unwrap();
        assert_eq!(p.deniers, 0);
        assert_eq!(p.resources.cloth, 0);
        assert_eq!(
            state.pending,
            Some(PendingInteraction::Favor(FavorQueue {
                grants: vec![FavorGrant { player: a, remaining: 1, tracks_used: vec![] }],
                index: 0,
                sub_choice: None,
                resume: FavorContinuation::ResumeSpecial,
            }))
        );
        assert_eq!(state.special.joust_field, None);

        // Spending the favor resumes the special phase and reaches the provost
        let state = resolve_favor_choice(&state, FavorTrack::Deniers).unwrap();
        assert_eq!(state.player(a).unwrap().deniers, 3);
        assert_eq!(state.phase, Phase::Provost);
    }

    #[test]
    fn test_scenario_c_full_dungeon_is_counted() {
        let mut state = create_initial_state(2, 3);
        let (a, b) = (state.players[0].color, state.players[1].color);
        state.castle.dungeon.houses = vec![Some(b), Some(b), Some(b), Some(b), Some(b), None];
        state.players[0].resources = Resources { food: 1, wood: 1, stone: 1, ..Resources::ZERO };
        state.players[0].workers.placed = 1;
        state.castle.workers = vec![a];
        state.phase = Phase::Activation;
        castle::begin(&mut state).unwrap();

        let state = resolve_castle_batch(&state, Resource::Wood, Resource::Stone).unwrap();
        assert!(state.castle.dungeon.is_full());
        // Best builder favor first
        let state = resolve_favor_choice(&state, FavorTrack::Prestige).unwrap();

        assert!(state.castle.dungeon.counted);
        assert_eq!(state.castle.current, SectionId::Walls);
        assert_eq!(state.favor_columns_available, 4);
        // b has five houses there and is owed a favor
        match &state.pending {
            Some(PendingInteraction::Favor(q)) => {
                assert_eq!(q.grants.len(), 1);
                assert_eq!(q.grants[0].player, b);
                assert_eq!(q.resume, FavorContinuation::AfterCount);
            }
            other => panic!("expected counting favors, got {other:?}"),
        }
    }

    #[test]
    fn test_scenario_d_prestige_build_with_exact_resources() {
        let mut state = create_initial_state(2, 4);
        let a = state.players[0].color;
        state.road[9] = Slot { building: Some(BuildingId::Architect), house: None, worker: Some(a) };
        state.road[10] = Slot { building: Some(BuildingId::Residential), house: Some(a), worker: None };
        state.stock.stone.retain(|&b| b != BuildingId::Architect);
        state.players[0].workers.placed = 1;
        state.players[0].resources = Resources { gold: 1, stone: 2, ..Resources::ZERO };
        state.players.iter_mut().for_each(|p| p.deniers = 0);
        state.phase = Phase::Workers;
        state.passing_scale = vec![Some(a), Some(state.players[1].color)];
        state.provost_position = 12;
        crate::provost::begin(&mut state).unwrap();

        let state = resolve_activation(&state, ActivationChoice::Building(BuildingId::Statue)).unwrap();
        let state = resolve_activation(&state, ActivationChoice::Slot(10)).unwrap();

        let p = state.player(a).unwrap();
        assert_eq!(p.resources, Resources::ZERO);
        assert_eq!(p.score, building(BuildingId::Statue).vp);
        assert!(!state.stock.prestige.contains(&BuildingId::Statue));
        assert_eq!(state.road[10].building, Some(BuildingId::Statue));
        assert_eq!(state.road[10].house, Some(a));
        // The statue's favor comes next
        assert!(matches!(state.pending, Some(PendingInteraction::Favor(_))));
    }

    #[test]
    fn test_scenario_e_everyone_passes() {
        let state = pass_all(workers_phase(3, 5));
        assert_eq!(state.phase, Phase::Provost);
        let first_passer = state.passing_scale[0].unwrap();
        assert_eq!(
            state.pending,
            Some(PendingInteraction::Provost { player: first_passer, kind: ProvostKind::Paid, max_delta: 3 })
        );
        assert!(state.log.iter().any(|l| l == "Special buildings"));
    }

    // ═════════════════════════════════════════════════════════════════════
    // REJECTIONS
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_wrong_phase() {
        let state = create_initial_state(2, 6);
        assert_eq!(
            place_worker_on_road(&state, 0),
            Err(Rejection::WrongPhase { expected: Phase::Workers, found: Phase::Income })
        );
    }

    #[test]
    fn test_nothing_to_resolve() {
        let state = workers_phase(2, 6);
        assert_eq!(resolve_gate(&state, GateTarget::Decline), Err(Rejection::NothingToResolve));
        assert_eq!(skip_castle_batch(&state), Err(Rejection::NothingToResolve));
    }

    #[test]
    fn test_insufficient_funds_leaves_state_alone() {
        let mut state = workers_phase(2, 6);
        state.players[0].deniers = 0;
        let before = state.clone();
        assert_eq!(place_worker_in_castle(&state), Err(Rejection::InsufficientFunds));
        assert_eq!(state, before);
    }

    #[test]
    fn test_game_over_rejects_everything() {
        let mut state = create_initial_state(2, 6);
        state.game_over = true;
        assert_eq!(collect_income(&state), Err(Rejection::GameOver));
        assert!(legal_actions(&state).is_empty());
        assert_eq!(acting_player(&state), None);
    }

    // ═════════════════════════════════════════════════════════════════════
    // GATE
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_gate_redirects_to_castle() {
        let state = workers_phase(2, 7);
        let a = state.players[0].color;
        let state = place_worker_on_special(&state, SpecialBuilding::Gate).unwrap();
        let state = pass_all(state);
        assert_eq!(state.pending, Some(PendingInteraction::Gate { player: a }));
        assert!(legal_actions(&state).contains(&Action::Gate(GateTarget::Castle)));

        assert_eq!(
            apply(&state, Action::Pass),
            Err(Rejection::WrongPendingInteraction { found: PendingKind::Gate })
        );
        assert_eq!(
            resolve_inn(&state, true),
            Err(Rejection::WrongPendingInteraction { found: PendingKind::Gate })
        );

        let state = resolve_gate(&state, GateTarget::Castle).unwrap();
        assert_eq!(state.special.gate, None);
        assert_eq!(state.castle.workers, vec![a]);
        assert_eq!(state.player(a).unwrap().workers.placed, 1);
        assert_eq!(state.phase, Phase::Provost);
    }

    #[test]
    fn test_gate_decline_returns_worker() {
        let state = workers_phase(2, 7);
        let a = state.players[0].color;
        let state = pass_all(place_worker_on_special(&state, SpecialBuilding::Gate).unwrap());
        let state = resolve_gate(&state, GateTarget::Decline).unwrap();
        assert_eq!(state.player(a).unwrap().workers.placed, 0);
    }

    // ═════════════════════════════════════════════════════════════════════
    // TURN FLOW
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_first_passer_earns_a_denier() {
        let state = workers_phase(3, 8);
        let before = state.players[0].deniers;
        let state = pass(&state).unwrap();
        assert_eq!(state.players[0].deniers, before + 1);
        assert_eq!(state.players[0].pass_order, Some(0));
        let second = state.players[1].deniers;
        let state = pass(&state).unwrap();
        assert_eq!(state.players[1].deniers, second);
    }

    #[test]
    fn test_income_includes_residentials() {
        let mut state = create_initial_state(2, 9);
        let a = state.players[0].color;
        state.road[12] = Slot { building: Some(BuildingId::Residential), house: Some(a), worker: None };
        let before = state.players[0].deniers;
        let state = collect_income(&state).unwrap();
        assert_eq!(state.players[0].deniers, before + 3);
        assert_eq!(state.phase, Phase::Workers);
    }

    #[test]
    fn test_stables_change_turn_order_next_turn() {
        let state = workers_phase(3, 10);
        let last = state.players[2].color;
        let state = pass(&state).unwrap();
        let state = pass(&state).unwrap();
        let state = place_worker_on_special(&state, SpecialBuilding::Stables).unwrap();
        let mut state = pass(&state).unwrap();
        while !matches!(state.phase, Phase::Income) {
            let action = legal_actions(&state)[0];
            state = apply(&state, action).unwrap();
        }
        assert_eq!(state.players[0].color, last);
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_winners_surface_draws() {
        let mut state = create_initial_state(3, 11);
        state.players[0].score = 20;
        state.players[1].score = 20;
        state.players[2].score = 5;
        assert_eq!(winners(&state), vec![state.players[0].color, state.players[1].color]);
        let standings = final_standings(&state);
        assert_eq!(standings[2], (state.players[2].color, 5));
    }

    #[test]
    fn test_snapshot_json() {
        let state = workers_phase(4, 12);
        let json = to_json(&state).unwrap();
        assert_eq!(from_json(&json).unwrap(), state);
    }

    // ═════════════════════════════════════════════════════════════════════
    // FULL GAMES
    // ═════════════════════════════════════════════════════════════════════

    #[test]
    fn test_game_completes_5p() {
        let state = play_full_game_random(42, 5);
        assert!(state.game_over);
        assert!(state.castle.towers.counted);
        assert!(state.log.len() <= LOG_CAPACITY);
        assert!(state.log[0].starts_with("Game over"));
        assert!(!winners(&state).is_empty());
    }

    #[test]
    fn test_game_completes_2p() {
        let state = play_full_game_random(7, 2);
        assert!(state.game_over);
        assert!(legal_actions(&state).is_empty());
    }

    #[test]
    fn test_deterministic_game() {
        let s1 = play_full_game_random(99, 4);
        let s2 = play_full_game_random(99, 4);
        assert_eq!(s1, s2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_random_games_keep_invariants(seed in any::<u64>(), players in 2u8..=5) {
            let state = play_full_game_random(seed, players);
            prop_assert!(state.game_over);
            prop_assert!(state.turn >= 2);
        }
    }
}
