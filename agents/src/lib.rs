pub mod agent;
pub mod random;
pub mod heuristic;

pub use agent::Agent;
pub use random::RandomAgent;
pub use heuristic::HeuristicAgent;

use caylus_engine::types::PlayerColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Agent selector used by configs and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Random,
    Heuristic,
}

impl AgentKind {
    pub const ALL: [AgentKind; 2] = [AgentKind::Random, AgentKind::Heuristic];
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Random => write!(f, "random"),
            AgentKind::Heuristic => write!(f, "heuristic"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(AgentKind::Random),
            "heuristic" => Ok(AgentKind::Heuristic),
            other => Err(format!("unknown agent '{other}' (expected random or heuristic)")),
        }
    }
}

/// Instantiate an agent of `kind` playing `color`.
pub fn build(kind: AgentKind, color: PlayerColor, seed: u64) -> Box<dyn Agent> {
    match kind {
        AgentKind::Random => Box::new(RandomAgent::new(color, seed)),
        AgentKind::Heuristic => Box::new(HeuristicAgent::new(color, seed)),
    }
}
