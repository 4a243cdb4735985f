//! TCP transport: newline-delimited JSON in both directions.
//!
//! A connection opens with a `JOIN` line naming the room and player; every
//! later line is an `ACTION`. Outbound traffic for the connection (room
//! snapshots, private prompts, errors) goes through the broadcaster, so a
//! single writer task owns the socket's write half.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::engine::broadcast::{Broadcaster, ChannelBroadcaster};
use crate::engine::error::{ErrorKind, RoomError};
use crate::engine::models::{ClientMessage, RoomId, ServerMessage};
use crate::engine::registry::RoomRegistry;
use crate::engine::room::RoomHandle;
use crate::games::monopoly::error::GameError;
use crate::games::monopoly::types::PlayerId;

/// Shared by every connection.
pub struct GameServer {
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<ChannelBroadcaster>,
}

impl GameServer {
    pub fn new(registry: Arc<RoomRegistry>, broadcaster: Arc<ChannelBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }
}

/// Accepts connections until the listener fails.
pub async fn serve(listener: TcpListener, server: Arc<GameServer>) -> std::io::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "accepting connections");
    loop {
        let (stream, peer) = listener.accept().await?;
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(&server, stream, peer).await {
                tracing::debug!(%peer, error = %e, "connection ended with error");
            }
        });
    }
}

struct Session {
    room: RoomHandle,
    room_id: RoomId,
    player_id: PlayerId,
}

async fn handle_connection(server: &GameServer, stream: TcpStream, peer: SocketAddr) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let Some(first) = lines.next_line().await? else {
        return Ok(());
    };
    let session = match open_session(server, &first).await {
        Ok(session) => session,
        Err(message) => {
            write_line(&mut writer, &message).await?;
            return Ok(());
        }
    };
    tracing::info!(%peer, room_id = %session.room_id, player_id = %session.player_id, "client connected");

    let rx = server
        .broadcaster
        .subscribe(&session.room_id, &session.player_id);
    let writer_task = tokio::spawn(async move {
        let mut outbound = ReceiverStream::new(rx);
        while let Some(message) = outbound.next().await {
            write_line(&mut writer, &message).await?;
        }
        Ok::<_, std::io::Error>(())
    });

    // The joiner has no subscription yet when the join commits, so it gets
    // its own copy of the state.
    match session.room.snapshot().await {
        Ok(state) => server.broadcaster.to_player(
            &session.room_id,
            &session.player_id,
            &ServerMessage::state(&session.room_id, &state),
        ),
        Err(e) => reply_error(server, &session, &e),
    }

    let result = read_actions(server, &session, &mut lines).await;

    writer_task.abort();
    let _ = writer_task.await;
    server.broadcaster.prune(&session.room_id, &session.player_id);
    tracing::info!(%peer, room_id = %session.room_id, player_id = %session.player_id, "client disconnected");
    server
        .registry
        .close_if_idle(&session.room_id, || {
            server.broadcaster.subscriber_count(&session.room_id) == 0
        })
        .await;
    result
}

/// Handles the opening `JOIN`. A player who is already seated is let back in.
async fn open_session(server: &GameServer, line: &str) -> Result<Session, ServerMessage> {
    let (room_id, player_id, name, color) = match serde_json::from_str::<ClientMessage>(line) {
        Ok(ClientMessage::Join {
            room_id,
            player_id,
            name,
            color,
        }) => (room_id, player_id, name, color),
        Ok(ClientMessage::Action { .. }) => {
            return Err(validation_error("the first message must be JOIN"));
        }
        Err(e) => return Err(validation_error(&format!("malformed message: {e}"))),
    };

    // A room torn down between lookup and join is respawned once.
    let mut retried = false;
    loop {
        let room = server
            .registry
            .room(&room_id)
            .await
            .map_err(|e| ServerMessage::error(&e))?;
        match room.join(&player_id, &name, color.as_deref()).await {
            Ok(()) => {}
            Err(RoomError::Game(GameError::AlreadyJoined(_))) => {
                tracing::debug!(room_id = %room_id, player_id = %player_id, "player reconnected");
            }
            Err(RoomError::RoomClosed) if !retried => {
                retried = true;
                continue;
            }
            Err(e) => return Err(ServerMessage::error(&e)),
        }
        return Ok(Session {
            room,
            room_id,
            player_id,
        });
    }
}

async fn read_actions<R>(
    server: &GameServer,
    session: &Session,
    lines: &mut tokio::io::Lines<R>,
) -> std::io::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ClientMessage>(&line) {
            Ok(ClientMessage::Action { action }) => {
                if let Err(e) = session.room.act(&session.player_id, action).await {
                    reply_error(server, session, &e);
                    if matches!(e, RoomError::RoomClosed) {
                        break;
                    }
                }
            }
            Ok(ClientMessage::Join { .. }) => {
                send(server, session, validation_error("already joined on this connection"));
            }
            Err(e) => send(server, session, validation_error(&format!("malformed message: {e}"))),
        }
    }
    Ok(())
}

fn reply_error(server: &GameServer, session: &Session, err: &RoomError) {
    send(server, session, ServerMessage::error(err));
}

fn send(server: &GameServer, session: &Session, message: ServerMessage) {
    server
        .broadcaster
        .to_player(&session.room_id, &session.player_id, &message);
}

fn validation_error(message: &str) -> ServerMessage {
    ServerMessage::Error {
        kind: ErrorKind::Validation,
        message: message.to_string(),
    }
}

async fn write_line(writer: &mut OwnedWriteHalf, message: &ServerMessage) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    writer.write_all(&line).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::room::RoomContext;
    use crate::engine::store::MemoryRoomStore;
    use crate::games::monopoly::rules::Rules;
    use std::time::Duration;

    async fn start() -> (SocketAddr, Arc<GameServer>) {
        let broadcaster = Arc::new(ChannelBroadcaster::new());
        let ctx = RoomContext {
            store: Arc::new(MemoryRoomStore::new()),
            broadcaster: broadcaster.clone(),
            persist_timeout: Duration::from_secs(1),
            auction_tick: Duration::from_secs(1),
        };
        let registry = Arc::new(RoomRegistry::new(ctx, Rules::default(), Some(5)));
        let server = Arc::new(GameServer::new(registry, broadcaster));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, Arc::clone(&server)));
        (addr, server)
    }

    async fn next_message(
        lines: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    ) -> serde_json::Value {
        let line = lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_join_then_action_round_trip() {
        let (addr, _server) = start().await;
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"type\":\"JOIN\",\"room_id\":\"r1\",\"player_id\":\"a\",\"name\":\"Ann\"}\n")
            .await
            .unwrap();
        let state = next_message(&mut lines).await;
        assert_eq!(state["type"], "STATE");
        assert_eq!(state["room_id"], "r1");
        assert_eq!(state["state"]["players"][0]["name"], "Ann");

        // Not enough players to start.
        writer
            .write_all(b"{\"type\":\"ACTION\",\"action\":{\"type\":\"START_GAME\"}}\n")
            .await
            .unwrap();
        let error = next_message(&mut lines).await;
        assert_eq!(error["type"], "ERROR");
        assert_eq!(error["kind"], "validation");

        writer.write_all(b"not json\n").await.unwrap();
        let error = next_message(&mut lines).await;
        assert_eq!(error["type"], "ERROR");
        assert!(error["message"].as_str().unwrap().starts_with("malformed message"));
    }

    #[tokio::test]
    async fn test_first_line_must_be_join() {
        let (addr, _server) = start().await;
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"type\":\"ACTION\",\"action\":{\"type\":\"ROLL_DICE\"}}\n")
            .await
            .unwrap();
        let error = next_message(&mut lines).await;
        assert_eq!(error["type"], "ERROR");
        assert_eq!(error["message"], "the first message must be JOIN");
        assert!(lines.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_room_closes_after_last_connection_leaves() {
        let (addr, server) = start().await;
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"type\":\"JOIN\",\"room_id\":\"r2\",\"player_id\":\"a\",\"name\":\"Ann\"}\n")
            .await
            .unwrap();
        assert_eq!(next_message(&mut lines).await["type"], "STATE");
        assert_eq!(server.registry().live_rooms().await, vec!["r2".to_string()]);

        drop(writer);
        drop(lines);
        let mut closed = false;
        for _ in 0..100 {
            if server.registry().live_rooms().await.is_empty() {
                closed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(closed, "room should close once nobody is connected");

        // Rejoining resumes the stored room.
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        writer
            .write_all(b"{\"type\":\"JOIN\",\"room_id\":\"r2\",\"player_id\":\"a\",\"name\":\"Ann\"}\n")
            .await
            .unwrap();
        let state = next_message(&mut lines).await;
        assert_eq!(state["type"], "STATE");
        assert_eq!(state["state"]["players"].as_array().unwrap().len(), 1);
    }
}
