pub mod types;
pub mod error;
pub mod buildings;
pub mod setup;
pub mod turn_order;
pub mod placement;
pub mod special;
pub mod provost;
pub mod activation;
pub mod favors;
pub mod castle;
pub mod legal;
pub mod engine;

pub use types::*;
pub use error::Rejection;
pub use buildings::{building, BuildingDef, Effect};
pub use engine::{apply, final_standings, winners, Action};
pub use legal::{acting_player, legal_actions};
pub use special::GateTarget;

#[cfg(test)]
mod tests;
