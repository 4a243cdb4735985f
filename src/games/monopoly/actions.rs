//! Player actions, one variant per action a client may send.

use serde::{Deserialize, Serialize};

use super::types::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameAction {
    StartGame,
    RollDice,
    /// Defaults to the square the player stands on.
    BuyProperty {
        #[serde(default)]
        property_id: Option<u8>,
    },
    StartAuction {
        #[serde(default)]
        property_id: Option<u8>,
    },
    Bid {
        amount: i64,
    },
    BuyHouse {
        property_id: u8,
    },
    SellHouse {
        property_id: u8,
    },
    MortgageProperty {
        property_id: u8,
    },
    UnmortgageProperty {
        property_id: u8,
    },
    PayJailFine,
    UseJailCard,
    EndTurn,
    ProposeTrade {
        to_player: PlayerId,
        #[serde(default)]
        offered_properties: Vec<u8>,
        #[serde(default)]
        requested_properties: Vec<u8>,
        #[serde(default)]
        offered_money: i64,
        #[serde(default)]
        requested_money: i64,
    },
    AcceptTrade,
    RejectTrade,
}

impl GameAction {
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::StartGame => "START_GAME",
            GameAction::RollDice => "ROLL_DICE",
            GameAction::BuyProperty { .. } => "BUY_PROPERTY",
            GameAction::StartAuction { .. } => "START_AUCTION",
            GameAction::Bid { .. } => "BID",
            GameAction::BuyHouse { .. } => "BUY_HOUSE",
            GameAction::SellHouse { .. } => "SELL_HOUSE",
            GameAction::MortgageProperty { .. } => "MORTGAGE_PROPERTY",
            GameAction::UnmortgageProperty { .. } => "UNMORTGAGE_PROPERTY",
            GameAction::PayJailFine => "PAY_JAIL_FINE",
            GameAction::UseJailCard => "USE_JAIL_CARD",
            GameAction::EndTurn => "END_TURN",
            GameAction::ProposeTrade { .. } => "PROPOSE_TRADE",
            GameAction::AcceptTrade => "ACCEPT_TRADE",
            GameAction::RejectTrade => "REJECT_TRADE",
        }
    }
}
