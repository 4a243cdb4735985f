//! Fan-out of room events to connected players.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::engine::models::{RoomId, ServerMessage};
use crate::games::monopoly::types::PlayerId;

/// Outbound queue depth per connection.
pub const PLAYER_QUEUE_CAPACITY: usize = 64;

/// Delivery is fire-and-forget: a slow or vanished client never blocks or
/// fails the room that produced the event.
pub trait Broadcaster: Send + Sync + 'static {
    fn to_room(&self, room_id: &str, message: &ServerMessage);

    fn to_player(&self, room_id: &str, player_id: &str, message: &ServerMessage);
}

#[derive(Debug, Default)]
pub struct ChannelBroadcaster {
    subscribers: Mutex<HashMap<RoomId, HashMap<PlayerId, mpsc::Sender<ServerMessage>>>>,
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a queue for one player, replacing any earlier connection of
    /// the same player.
    pub fn subscribe(&self, room_id: &str, player_id: &str) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(PLAYER_QUEUE_CAPACITY);
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.entry(room_id.to_string())
                .or_default()
                .insert(player_id.to_string(), tx);
        }
        rx
    }

    pub fn unsubscribe(&self, room_id: &str, player_id: &str) {
        if let Ok(mut subs) = self.subscribers.lock() {
            if let Some(room) = subs.get_mut(room_id) {
                room.remove(player_id);
                if room.is_empty() {
                    subs.remove(room_id);
                }
            }
        }
    }

    /// Removes the player's queue once its receiver is gone. A newer
    /// connection of the same player keeps its queue.
    pub fn prune(&self, room_id: &str, player_id: &str) {
        if let Ok(mut subs) = self.subscribers.lock() {
            if let Some(room) = subs.get_mut(room_id) {
                if room.get(player_id).is_some_and(mpsc::Sender::is_closed) {
                    room.remove(player_id);
                }
                if room.is_empty() {
                    subs.remove(room_id);
                }
            }
        }
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.subscribers
            .lock()
            .map(|subs| subs.get(room_id).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    fn deliver(room_id: &str, player_id: &str, tx: &mpsc::Sender<ServerMessage>, message: &ServerMessage) {
        match tx.try_send(message.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(room_id, player_id, "outbound queue full, dropping message");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(room_id, player_id, "connection gone, dropping message");
            }
        }
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn to_room(&self, room_id: &str, message: &ServerMessage) {
        let Ok(subs) = self.subscribers.lock() else {
            return;
        };
        if let Some(room) = subs.get(room_id) {
            for (player_id, tx) in room {
                Self::deliver(room_id, player_id, tx, message);
            }
        }
    }

    fn to_player(&self, room_id: &str, player_id: &str, message: &ServerMessage) {
        let Ok(subs) = self.subscribers.lock() else {
            return;
        };
        if let Some(tx) = subs.get(room_id).and_then(|room| room.get(player_id)) {
            Self::deliver(room_id, player_id, tx, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ErrorKind;

    fn error(message: &str) -> ServerMessage {
        ServerMessage::Error {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    #[test]
    fn test_room_and_player_addressing() {
        let hub = ChannelBroadcaster::new();
        let mut a = hub.subscribe("r1", "a");
        let mut b = hub.subscribe("r1", "b");
        let mut other = hub.subscribe("r2", "c");

        hub.to_room("r1", &error("everyone"));
        hub.to_player("r1", "b", &error("just b"));

        assert_eq!(a.try_recv().unwrap(), error("everyone"));
        assert!(a.try_recv().is_err());
        assert_eq!(b.try_recv().unwrap(), error("everyone"));
        assert_eq!(b.try_recv().unwrap(), error("just b"));
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let hub = ChannelBroadcaster::new();
        let mut rx = hub.subscribe("r1", "a");
        for i in 0..PLAYER_QUEUE_CAPACITY + 5 {
            hub.to_player("r1", "a", &error(&i.to_string()));
        }
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, PLAYER_QUEUE_CAPACITY);
    }

    #[test]
    fn test_unsubscribe_closes_queue() {
        let hub = ChannelBroadcaster::new();
        let mut rx = hub.subscribe("r1", "a");
        hub.unsubscribe("r1", "a");
        assert_eq!(hub.subscriber_count("r1"), 0);
        hub.to_room("r1", &error("gone"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_prune_keeps_newer_connection() {
        let hub = ChannelBroadcaster::new();
        let old = hub.subscribe("r1", "a");
        let mut newer = hub.subscribe("r1", "a");
        drop(old);
        hub.prune("r1", "a");
        assert_eq!(hub.subscriber_count("r1"), 1);

        hub.to_player("r1", "a", &error("still here"));
        assert_eq!(newer.try_recv().unwrap(), error("still here"));

        drop(newer);
        hub.prune("r1", "a");
        assert_eq!(hub.subscriber_count("r1"), 0);
    }
}
