pub mod actions;
pub mod board;
pub mod cards;
pub mod dice;
pub mod economy;
pub mod error;
pub mod invariants;
pub mod machine;
pub mod resolver;
pub mod rules;
pub mod types;

pub use actions::GameAction;
pub use error::GameError;
pub use machine::{turn_phase, AuctionTick, MonopolyGame, TurnPhase};
pub use rules::Rules;
pub use types::GameState;
