use crate::error::TournamentError;
use caylus_agents::AgentKind;
use caylus_engine::setup::PLAYER_COUNTS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tournament settings, read from JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    pub games: u32,
    pub players: u8,
    /// Agents seated in rotation; game `g` starts the rotation at `g`.
    pub agents: Vec<AgentKind>,
    pub base_seed: u64,
    pub max_decisions: usize,
    pub elo_k: f64,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        TournamentConfig {
            games: 100,
            players: 4,
            agents: vec![AgentKind::Random, AgentKind::Heuristic],
            base_seed: 42,
            max_decisions: 50_000,
            elo_k: 16.0,
        }
    }
}

impl TournamentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TournamentError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reject settings no game can be played with.
    pub fn validate(&self) -> Result<(), TournamentError> {
        if !PLAYER_COUNTS.contains(&self.players) {
            return Err(TournamentError::PlayerCount { players: self.players as usize });
        }
        if self.agents.is_empty() {
            return Err(TournamentError::EmptyRoster);
        }
        Ok(())
    }

    /// Seed of game number `game`.
    pub fn seed_for(&self, game: u32) -> u64 {
        self.base_seed.wrapping_add(game as u64 * 1000)
    }

    /// Seating for game number `game`, one agent per player.
    pub fn roster(&self, game: u32) -> Vec<AgentKind> {
        if self.agents.is_empty() {
            return Vec::new();
        }
        (0..self.players as usize)
            .map(|seat| self.agents[(game as usize + seat) % self.agents.len()])
            .collect()
    }
}
