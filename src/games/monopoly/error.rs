use thiserror::Error;

use super::board::Group;
use crate::engine::error::ErrorKind;

/// A rejected action. The game state is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game has not started")]
    NotStarted,
    #[error("game already started")]
    AlreadyStarted,
    #[error("game is over")]
    GameOver,
    #[error("only the room creator can start the game")]
    NotHost,
    #[error("at least {min} players are needed to start")]
    NotEnoughPlayers { min: usize },
    #[error("room is full ({max} players)")]
    RoomFull { max: usize },
    #[error("player {0} already joined")]
    AlreadyJoined(String),
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("you are bankrupt")]
    PlayerBankrupt,
    #[error("you already rolled this turn")]
    AlreadyRolled,
    #[error("you must roll before ending your turn")]
    MustRollFirst,
    #[error("an auction is in progress")]
    AuctionInProgress,
    #[error("bid must exceed the current highest bid of {highest}")]
    BidTooLow { highest: i64 },
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("property {0} is already owned")]
    AlreadyOwned(u8),
    #[error("you do not own property {0}")]
    NotOwner(u8),
    #[error("property {0} is mortgaged")]
    Mortgaged(u8),
    #[error("property {0} is not mortgaged")]
    NotMortgaged(u8),
    #[error("property {0} has buildings")]
    HasBuildings(u8),
    #[error("a {0:?} property still has buildings")]
    GroupHasBuildings(Group),
    #[error("property {0} cannot hold houses")]
    NotAStreet(u8),
    #[error("you do not own every {0:?} property")]
    NoMonopoly(Group),
    #[error("a {0:?} property is mortgaged")]
    GroupMortgaged(Group),
    #[error("houses must be built and sold evenly across the group")]
    UnevenBuilding,
    #[error("property {0} already has a hotel")]
    HotelLimit(u8),
    #[error("property {0} has no houses")]
    NoHouses(u8),
    #[error("you are not in jail")]
    NotInJail,
    #[error("you have no get-out-of-jail-free card")]
    NoJailCard,
    #[error("a trade is already pending")]
    TradePending,
    #[error("only the recipient can answer this trade")]
    NotTradeRecipient,
    #[error("invalid trade: {0}")]
    InvalidTrade(String),
    #[error("unknown player {0}")]
    UnknownPlayer(String),
    #[error("unknown property {0}")]
    UnknownProperty(u8),
    #[error("no auction is running")]
    NoAuction,
    #[error("no trade is pending")]
    NoTrade,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::UnknownPlayer(_)
            | GameError::UnknownProperty(_)
            | GameError::NoAuction
            | GameError::NoTrade => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}
