//! Registry of live rooms: spawns an actor the first time a room is used.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;

use crate::engine::config::EngineConfig;
use crate::engine::error::{RoomError, StoreError};
use crate::engine::models::RoomId;
use crate::engine::room::{spawn_room, RoomContext, RoomHandle};
use crate::games::monopoly::dice::{DiceSource, RandomDice};
use crate::games::monopoly::machine::MonopolyGame;
use crate::games::monopoly::rules::Rules;
use crate::games::monopoly::types::{GameState, RoomStatus};

pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
    ctx: RoomContext,
    rules: Rules,
    seed: Option<u64>,
}

impl RoomRegistry {
    pub fn new(ctx: RoomContext, rules: Rules, seed: Option<u64>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            ctx,
            rules,
            seed,
        }
    }

    pub fn from_config(ctx: RoomContext, config: &EngineConfig) -> Self {
        Self::new(ctx, config.rules.clone(), config.server.seed)
    }

    /// Returns the running room, spawning it (from the store if it was
    /// saved before, fresh otherwise) on first use.
    pub async fn room(&self, room_id: &str) -> Result<RoomHandle, RoomError> {
        if let Some(handle) = self.get(room_id).await {
            return Ok(handle);
        }

        let stored = self.load(room_id).await?;
        let mut rooms = self.rooms.lock().await;
        // Someone else may have spawned it while the store was read.
        if let Some(handle) = rooms.get(room_id).filter(|h| !h.is_closed()) {
            return Ok(handle.clone());
        }
        let resumed = stored.is_some();
        let mut rng = self.rng_for(room_id);
        let state = stored.unwrap_or_else(|| GameState::new(&mut rng));
        let dice: Box<dyn DiceSource> = match self.seed {
            Some(_) => Box::new(RandomDice::seeded(room_seed(self.seed, room_id).wrapping_add(1))),
            None => Box::new(RandomDice::from_entropy()),
        };
        let game = MonopolyGame::new(self.rules.clone(), dice);
        let handle = spawn_room(room_id, game, state, self.ctx.clone());
        rooms.insert(room_id.to_string(), handle.clone());
        tracing::info!(room_id, resumed, live_rooms = rooms.len(), "room spawned");
        Ok(handle)
    }

    /// The room if it is currently running.
    pub async fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .filter(|h| !h.is_closed())
            .cloned()
    }

    /// Stops a room's actor. Returns whether it was running.
    pub async fn close(&self, room_id: &str) -> bool {
        let handle = self.rooms.lock().await.remove(room_id);
        match handle {
            Some(handle) => {
                handle.shutdown().await;
                tracing::info!(room_id, "room closed");
                true
            }
            None => false,
        }
    }

    /// Stops the room if `idle` still holds once the registry is locked.
    /// Its state is already in the store, so the next `room` call resumes it.
    pub async fn close_if_idle(&self, room_id: &str, idle: impl FnOnce() -> bool) -> bool {
        let handle = {
            let mut rooms = self.rooms.lock().await;
            if !rooms.contains_key(room_id) || !idle() {
                return false;
            }
            rooms.remove(room_id)
        };
        match handle {
            Some(handle) => {
                handle.shutdown().await;
                tracing::info!(room_id, "idle room closed");
                true
            }
            None => false,
        }
    }

    pub async fn close_all(&self) {
        let handles: Vec<_> = self.rooms.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }

    pub async fn live_rooms(&self) -> Vec<RoomId> {
        let mut ids: Vec<_> = self.rooms.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every stored room and its status.
    pub async fn list(&self) -> Result<Vec<(RoomId, RoomStatus)>, RoomError> {
        let store = Arc::clone(&self.ctx.store);
        let listed = tokio::task::spawn_blocking(move || store.list())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))??;
        Ok(listed)
    }

    async fn load(&self, room_id: &str) -> Result<Option<GameState>, RoomError> {
        let store = Arc::clone(&self.ctx.store);
        let id = room_id.to_string();
        let read = tokio::task::spawn_blocking(move || store.load(&id));
        let record = match tokio::time::timeout(self.ctx.persist_timeout, read).await {
            Ok(joined) => joined.map_err(|e| StoreError::Unavailable(e.to_string()))??,
            Err(_) => return Err(RoomError::PersistTimeout),
        };
        Ok(record.map(|r| r.state))
    }

    fn rng_for(&self, room_id: &str) -> StdRng {
        match self.seed {
            Some(_) => StdRng::seed_from_u64(room_seed(self.seed, room_id)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Per-room seed, so rooms under one global seed still differ.
fn room_seed(seed: Option<u64>, room_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    room_id.hash(&mut hasher);
    seed.unwrap_or_default() ^ hasher.finish()
}
