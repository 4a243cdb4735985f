use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use monopoly_room_engine::engine::broadcast::ChannelBroadcaster;
use monopoly_room_engine::engine::config::{load_config, load_default_config};
use monopoly_room_engine::engine::registry::RoomRegistry;
use monopoly_room_engine::engine::room::RoomContext;
use monopoly_room_engine::engine::store::{JsonFileRoomStore, MemoryRoomStore, RoomStore};
use monopoly_room_engine::server::{serve, GameServer};

#[derive(Parser)]
#[command(name = "monopoly-room-engine", about = "Multiplayer Monopoly room server")]
struct Cli {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "MONOPOLY_ENGINE_PORT")]
    port: Option<u16>,

    /// Path to monopoly_engine.toml (default: auto-discover)
    #[arg(long, env = "MONOPOLY_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for room records (default: in memory)
    #[arg(long, env = "MONOPOLY_ENGINE_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| format!("Failed to load config: {}", e))?,
        None => load_default_config(),
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.data_dir {
        config.server.data_dir = Some(dir);
    }

    let store: Arc<dyn RoomStore> = match &config.server.data_dir {
        Some(dir) => {
            let store = JsonFileRoomStore::open(dir)?;
            tracing::info!(dir = %store.dir().display(), "using file room store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("no data_dir configured, rooms are kept in memory only");
            Arc::new(MemoryRoomStore::new())
        }
    };

    let broadcaster = Arc::new(ChannelBroadcaster::new());
    let ctx = RoomContext {
        store,
        broadcaster: broadcaster.clone(),
        persist_timeout: config.server.persist_timeout(),
        auction_tick: config.server.auction_tick(),
    };
    let registry = Arc::new(RoomRegistry::from_config(ctx, &config));
    let server = Arc::new(GameServer::new(Arc::clone(&registry), broadcaster));

    let addr: SocketAddr = ([0, 0, 0, 0], config.server.port).into();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "starting room server");

    tokio::select! {
        result = serve(listener, server) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            registry.close_all().await;
        }
    }

    Ok(())
}
