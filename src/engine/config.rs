//! Engine configuration: game rules plus server knobs, loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::games::monopoly::rules::Rules;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Room records are kept in memory when unset.
    pub data_dir: Option<PathBuf>,
    pub persist_timeout_ms: u64,
    /// Auction countdown period; one tick is one auction second.
    pub auction_tick_ms: u64,
    /// Fixed seed for dice and deck shuffles; each room derives its own.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7878,
            data_dir: None,
            persist_timeout_ms: 2000,
            auction_tick_ms: 1000,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn auction_tick(&self) -> Duration {
        Duration::from_millis(self.auction_tick_ms.max(1))
    }
}

/// Top-level TOML file structure.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: Rules,
    pub server: ServerConfig,
}

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &Path) -> Result<EngineConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

/// Try well-known paths, falling back to built-in defaults.
pub fn load_default_config() -> EngineConfig {
    let candidates = [
        "monopoly_engine.toml",
        "../monopoly_engine.toml",
        "/etc/monopoly/monopoly_engine.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_config(p) {
                Ok(config) => {
                    tracing::info!(path = %p.display(), "loaded engine config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load engine config");
                }
            }
        }
    }
    tracing::info!("no monopoly_engine.toml found, using built-in defaults");
    EngineConfig::default()
}
