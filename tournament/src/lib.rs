pub mod config;
pub mod database;
pub mod error;
pub mod runner;

pub use config::TournamentConfig;
pub use database::Database;
pub use error::TournamentError;
pub use runner::{play, run_batch, run_game, GameResult, PlayerResult};
