// ═══════════════════════════════════════════════════════════════════════
// Game Runner - runs complete headless games with agents
// ═══════════════════════════════════════════════════════════════════════

use crate::config::TournamentConfig;
use crate::error::TournamentError;
use caylus_agents::{build, Agent, AgentKind};
use caylus_engine::engine::{self, winners};
use caylus_engine::legal::{acting_player, legal_actions};
use caylus_engine::setup::{create_initial_state, PLAYER_COUNTS};
use caylus_engine::types::*;
use rayon::prelude::*;
use std::collections::HashMap;

/// Result of a completed game.
#[derive(Debug, Clone)]
pub struct GameResult {
    pub seed: u64,
    pub turns: u32,
    /// More than one entry is a draw.
    pub winners: Vec<PlayerColor>,
    pub decisions: usize,
    pub player_results: Vec<PlayerResult>,
}

impl GameResult {
    pub fn is_draw(&self) -> bool {
        self.winners.len() > 1
    }
}

#[derive(Debug, Clone)]
pub struct PlayerResult {
    pub color: PlayerColor,
    pub agent: AgentKind,
    pub score: u32,
    pub deniers: u32,
    pub houses_placed: u32,
    pub favors: u32,
}

/// Play a complete game and return its final state. Seat `i` of `roster`
/// plays the `i`-th player in the initial turn order.
pub fn play(
    roster: &[AgentKind],
    seed: u64,
    max_decisions: usize, // safety limit to prevent infinite loops
) -> Result<(GameState, usize), TournamentError> {
    let Some(player_count) = u8::try_from(roster.len()).ok().filter(|n| PLAYER_COUNTS.contains(n)) else {
        return Err(TournamentError::PlayerCount { players: roster.len() });
    };
    let mut state = create_initial_state(player_count, seed);
    let mut agents: HashMap<PlayerColor, Box<dyn Agent>> = state
        .players
        .iter()
        .zip(roster.iter())
        .enumerate()
        .map(|(i, (p, &kind))| (p.color, build(kind, p.color, seed.wrapping_add(i as u64))))
        .collect();

    let mut decisions = 0;
    while !state.game_over {
        let options = legal_actions(&state);
        let stuck = TournamentError::Stuck { seed, phase: state.phase, turn: state.turn };
        let Some(color) = acting_player(&state).filter(|_| !options.is_empty()) else {
            return Err(stuck);
        };
        let Some(agent) = agents.get_mut(&color) else {
            return Err(stuck);
        };

        let action = agent.decide(&state, &options);
        tracing::trace!(seed, %color, ?action, "decision");
        state = engine::apply(&state, action).map_err(|reason| TournamentError::Rejected { seed, reason })?;

        decisions += 1;
        if decisions > max_decisions {
            return Err(TournamentError::DecisionLimit { seed, limit: max_decisions, turn: state.turn });
        }
    }

    tracing::debug!(seed, turns = state.turn, decisions, "game finished");
    Ok((state, decisions))
}

/// Run a complete game and summarize it.
pub fn run_game(roster: &[AgentKind], seed: u64, max_decisions: usize) -> Result<GameResult, TournamentError> {
    let (state, decisions) = play(roster, seed, max_decisions)?;
    let seats: HashMap<PlayerColor, AgentKind> = create_initial_state(roster.len() as u8, seed)
        .players
        .iter()
        .zip(roster.iter())
        .map(|(p, &kind)| (p.color, kind))
        .collect();
    Ok(build_result(&state, seed, decisions, &seats))
}

fn build_result(
    state: &GameState,
    seed: u64,
    decisions: usize,
    seats: &HashMap<PlayerColor, AgentKind>,
) -> GameResult {
    let player_results = state
        .players
        .iter()
        .map(|p| PlayerResult {
            color: p.color,
            agent: seats.get(&p.color).copied().unwrap_or(AgentKind::Random),
            score: p.score,
            deniers: p.deniers,
            houses_placed: p.houses.placed,
            favors: FavorTrack::ALL.iter().map(|&t| p.favors.get(t) as u32).sum(),
        })
        .collect();

    GameResult {
        seed,
        turns: state.turn,
        winners: winners(state),
        decisions,
        player_results,
    }
}

/// Run every game of `config` in parallel. Results keep game order.
pub fn run_batch(config: &TournamentConfig) -> Vec<Result<GameResult, TournamentError>> {
    tracing::info!(games = config.games, players = config.players, "starting batch");
    (0..config.games)
        .into_par_iter()
        .map(|g| {
            let result = run_game(&config.roster(g), config.seed_for(g), config.max_decisions);
            if let Err(e) = &result {
                tracing::warn!(game = g, error = %e, "game failed");
            }
            result
        })
        .collect()
}
