//! Wire and storage data types for rooms.

use serde::{Deserialize, Serialize};

use crate::engine::error::{ErrorKind, RoomError};
use crate::games::monopoly::actions::GameAction;
use crate::games::monopoly::cards::DeckKind;
use crate::games::monopoly::machine::{turn_phase, TurnPhase};
use crate::games::monopoly::types::{GameState, Notice, PlayerId, RoomStatus, TradeProposal};

pub type RoomId = String;

/// One line sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    Join {
        room_id: RoomId,
        player_id: PlayerId,
        name: String,
        #[serde(default)]
        color: Option<String>,
    },
    Action {
        action: GameAction,
    },
}

/// One line sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    State {
        room_id: RoomId,
        status: RoomStatus,
        phase: TurnPhase,
        state: Box<GameState>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    BuyOrAuction {
        property_id: u8,
        name: String,
        price: i64,
    },
    CardDrawn {
        deck: DeckKind,
        text: String,
    },
    TradeProposed {
        trade: TradeProposal,
    },
}

impl ServerMessage {
    /// Full snapshot of a room.
    pub fn state(room_id: &str, state: &GameState) -> Self {
        ServerMessage::State {
            room_id: room_id.to_string(),
            status: RoomStatus::from(state),
            phase: turn_phase(state),
            state: Box::new(state.clone()),
        }
    }

    pub fn error(err: &RoomError) -> Self {
        ServerMessage::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<Notice> for ServerMessage {
    fn from(notice: Notice) -> Self {
        match notice {
            Notice::BuyOrAuction {
                property_id,
                name,
                price,
                ..
            } => ServerMessage::BuyOrAuction {
                property_id,
                name,
                price,
            },
            Notice::CardDrawn { deck, text, .. } => ServerMessage::CardDrawn { deck, text },
            Notice::TradeProposed { trade, .. } => ServerMessage::TradeProposed { trade },
        }
    }
}

/// What the room store keeps per room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub state: GameState,
}

impl RoomRecord {
    pub fn new(room_id: &str, state: GameState) -> Self {
        Self {
            room_id: room_id.to_string(),
            status: RoomStatus::from(&state),
            state,
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.state.players.iter().map(|p| p.id.as_str())
    }
}
