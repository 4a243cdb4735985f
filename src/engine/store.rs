//! Room persistence.
//!
//! The store is a durability sink only: each room actor owns its live
//! state and writes through after every committed mutation. Reads happen
//! once, when a room is first spawned.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::engine::error::StoreError;
use crate::engine::models::{RoomId, RoomRecord};
use crate::games::monopoly::types::RoomStatus;

/// Blocking storage backend; room actors call it from the blocking pool.
pub trait RoomStore: Send + Sync + 'static {
    fn load(&self, room_id: &str) -> Result<Option<RoomRecord>, StoreError>;

    fn save(&self, record: &RoomRecord) -> Result<(), StoreError>;

    /// Every stored room with its status, for lobby listings.
    fn list(&self) -> Result<Vec<(RoomId, RoomStatus)>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: Mutex<HashMap<RoomId, RoomRecord>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> Result<std::sync::MutexGuard<'_, HashMap<RoomId, RoomRecord>>, StoreError> {
        self.rooms
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl RoomStore for MemoryRoomStore {
    fn load(&self, room_id: &str) -> Result<Option<RoomRecord>, StoreError> {
        Ok(self.rooms()?.get(room_id).cloned())
    }

    fn save(&self, record: &RoomRecord) -> Result<(), StoreError> {
        self.rooms()?.insert(record.room_id.clone(), record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<(RoomId, RoomStatus)>, StoreError> {
        let mut rooms: Vec<_> = self
            .rooms()?
            .values()
            .map(|r| (r.room_id.clone(), r.status))
            .collect();
        rooms.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rooms)
    }
}

/// One pretty-printed JSON file per room under `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileRoomStore {
    dir: PathBuf,
}

impl JsonFileRoomStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::info!(dir = %dir.display(), "opened room store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, room_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !room_id.is_empty()
            && room_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidRoomId(room_id.to_string()));
        }
        Ok(self.dir.join(format!("{room_id}.json")))
    }
}

impl RoomStore for JsonFileRoomStore {
    fn load(&self, room_id: &str) -> Result<Option<RoomRecord>, StoreError> {
        let path = self.path_for(room_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes a sibling temp file and renames it over the old record, so a
    /// crash mid-write never leaves a truncated room behind.
    fn save(&self, record: &RoomRecord) -> Result<(), StoreError> {
        let path = self.path_for(&record.room_id)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<(RoomId, RoomStatus)>, StoreError> {
        let mut rooms = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|c| serde_json::from_str::<RoomRecord>(&c).map_err(StoreError::from))
            {
                Ok(record) => rooms.push((record.room_id, record.status)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable room record");
                }
            }
        }
        rooms.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rooms)
    }
}
