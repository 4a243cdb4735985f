//! Error taxonomy shared by the room engine and its transport.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::games::monopoly::error::GameError;

/// Category reported to clients alongside the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Persistence,
    Unavailable,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("room record is malformed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid room id {0:?}")]
    InvalidRoomId(String),
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("could not persist room: {0}")]
    Store(#[from] StoreError),
    #[error("room {0} not found")]
    RoomNotFound(String),
    #[error("persisting the room timed out")]
    PersistTimeout,
    #[error("room is closed")]
    RoomClosed,
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomError::Game(e) => e.kind(),
            RoomError::Store(StoreError::InvalidRoomId(_)) => ErrorKind::Validation,
            RoomError::Store(_) | RoomError::PersistTimeout => ErrorKind::Persistence,
            RoomError::RoomNotFound(_) => ErrorKind::NotFound,
            RoomError::RoomClosed => ErrorKind::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(RoomError::from(GameError::NotYourTurn).kind(), ErrorKind::Validation);
        assert_eq!(RoomError::from(GameError::NoAuction).kind(), ErrorKind::NotFound);
        assert_eq!(RoomError::PersistTimeout.kind(), ErrorKind::Persistence);
        assert_eq!(
            RoomError::from(StoreError::Unavailable("down".into())).kind(),
            ErrorKind::Persistence
        );
        assert_eq!(RoomError::RoomClosed.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_game_error_message_passes_through() {
        let err = RoomError::from(GameError::InsufficientFunds { needed: 60, available: 10 });
        assert_eq!(err.to_string(), "insufficient funds: need 60, have 10");
    }
}
