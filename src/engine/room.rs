//! Per-room actor.
//!
//! Each room is a single task that owns its `GameState`. Player commands
//! and auction ticks arrive on the same loop, so they never interleave.
//! A mutation is applied to a copy, persisted, and only then committed and
//! broadcast; a rejected action or a failed write leaves the live state as
//! it was.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::engine::broadcast::Broadcaster;
use crate::engine::error::{RoomError, StoreError};
use crate::engine::models::{RoomId, RoomRecord, ServerMessage};
use crate::engine::store::RoomStore;
use crate::games::monopoly::actions::GameAction;
use crate::games::monopoly::machine::{AuctionTick, MonopolyGame};
use crate::games::monopoly::types::{GameState, PlayerId};

const COMMAND_QUEUE: usize = 64;

/// Collaborators shared by every room.
#[derive(Clone)]
pub struct RoomContext {
    pub store: Arc<dyn RoomStore>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub persist_timeout: Duration,
    pub auction_tick: Duration,
}

enum Command {
    Join {
        player_id: PlayerId,
        name: String,
        color: Option<String>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Act {
        player_id: PlayerId,
        action: GameAction,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Snapshot {
        reply: oneshot::Sender<GameState>,
    },
    Shutdown,
}

enum Event {
    Command(Command),
    Tick,
    Closed,
}

/// Cheap, cloneable address of a running room.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    room_id: RoomId,
    tx: mpsc::Sender<Command>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn join(&self, player_id: &str, name: &str, color: Option<&str>) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Join {
            player_id: player_id.to_string(),
            name: name.to_string(),
            color: color.map(str::to_string),
            reply,
        })
        .await?;
        rx.await.map_err(|_| RoomError::RoomClosed)?
    }

    pub async fn act(&self, player_id: &str, action: GameAction) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Act {
            player_id: player_id.to_string(),
            action,
            reply,
        })
        .await?;
        rx.await.map_err(|_| RoomError::RoomClosed)?
    }

    pub async fn snapshot(&self) -> Result<GameState, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| RoomError::RoomClosed)
    }

    /// Stops the actor; a running auction timer goes with it.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }

    async fn send(&self, command: Command) -> Result<(), RoomError> {
        self.tx.send(command).await.map_err(|_| RoomError::RoomClosed)
    }
}

struct RoomActor {
    room_id: RoomId,
    game: MonopolyGame,
    state: GameState,
    ctx: RoomContext,
    ticker: Option<Interval>,
}

/// Starts the actor for `room_id` with an already loaded (or fresh) state.
pub fn spawn_room(room_id: &str, game: MonopolyGame, state: GameState, ctx: RoomContext) -> RoomHandle {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
    let actor = RoomActor {
        room_id: room_id.to_string(),
        game,
        state,
        ctx,
        ticker: None,
    };
    tokio::spawn(actor.run(rx));
    RoomHandle {
        room_id: room_id.to_string(),
        tx,
    }
}

/// Writes `record` off the async runtime, bounded by `limit`.
async fn persist_record(
    store: Arc<dyn RoomStore>,
    room_id: RoomId,
    limit: Duration,
    record: RoomRecord,
) -> Result<(), RoomError> {
    let write = tokio::task::spawn_blocking(move || store.save(&record));
    match tokio::time::timeout(limit, write).await {
        Ok(Ok(result)) => result.map_err(|e| {
            tracing::error!(%room_id, error = %e, "room store write failed");
            RoomError::from(e)
        }),
        Ok(Err(join_error)) => {
            tracing::error!(%room_id, error = %join_error, "room store write panicked");
            Err(StoreError::Unavailable(join_error.to_string()).into())
        }
        Err(_) => {
            tracing::error!(%room_id, "room store write timed out");
            Err(RoomError::PersistTimeout)
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl RoomActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::info!(room_id = %self.room_id, players = self.state.players.len(), "room started");
        self.sync_ticker();

        loop {
            let event = tokio::select! {
                cmd = rx.recv() => cmd.map_or(Event::Closed, Event::Command),
                _ = next_tick(&mut self.ticker) => Event::Tick,
            };
            match event {
                Event::Closed | Event::Command(Command::Shutdown) => break,
                Event::Command(command) => self.handle(command).await,
                Event::Tick => self.on_tick().await,
            }
        }

        self.ticker = None;
        tracing::info!(room_id = %self.room_id, "room stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Join {
                player_id,
                name,
                color,
                reply,
            } => {
                let result = self.join(&player_id, &name, color.as_deref()).await;
                if let Err(e) = &result {
                    tracing::warn!(room_id = %self.room_id, %player_id, error = %e, "join rejected");
                }
                let _ = reply.send(result);
            }
            Command::Act {
                player_id,
                action,
                reply,
            } => {
                let result = self.act(&player_id, &action).await;
                if let Err(e) = &result {
                    tracing::warn!(
                        room_id = %self.room_id,
                        %player_id,
                        action = action.name(),
                        error = %e,
                        "action rejected"
                    );
                }
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.clone());
            }
            Command::Shutdown => {}
        }
    }

    async fn join(&mut self, player_id: &str, name: &str, color: Option<&str>) -> Result<(), RoomError> {
        let mut next = self.state.clone();
        self.game.join(&mut next, player_id, name, color)?;
        self.commit(next).await?;
        tracing::info!(room_id = %self.room_id, player_id, "player joined");
        Ok(())
    }

    async fn act(&mut self, player_id: &str, action: &GameAction) -> Result<(), RoomError> {
        let mut next = self.state.clone();
        let notices = self.game.apply(&mut next, player_id, action)?;
        self.commit(next).await?;
        tracing::debug!(room_id = %self.room_id, player_id, action = action.name(), "action committed");
        for notice in notices {
            let recipient = notice.recipient().to_string();
            self.ctx
                .broadcaster
                .to_player(&self.room_id, &recipient, &ServerMessage::from(notice));
        }
        Ok(())
    }

    async fn on_tick(&mut self) {
        let mut next = self.state.clone();
        let outcome = self.game.auction_tick(&mut next);
        if outcome == AuctionTick::Idle {
            self.ticker = None;
            return;
        }
        tracing::debug!(room_id = %self.room_id, ?outcome, "auction tick");
        if let Err(e) = self.commit(next).await {
            tracing::error!(room_id = %self.room_id, error = %e, "failed to persist auction tick");
        }
    }

    /// Persists `next`, then makes it the live state and broadcasts it.
    async fn commit(&mut self, next: GameState) -> Result<(), RoomError> {
        let record = RoomRecord::new(&self.room_id, next);
        persist_record(
            Arc::clone(&self.ctx.store),
            self.room_id.clone(),
            self.ctx.persist_timeout,
            record.clone(),
        )
        .await?;

        let was_won = self.state.game_won;
        self.state = record.state;
        if !was_won && self.state.game_won {
            tracing::info!(room_id = %self.room_id, winner = ?self.state.winner, "game over");
        }
        self.sync_ticker();
        self.broadcast_state();
        Ok(())
    }

    /// Runs the auction timer exactly while an auction is open.
    fn sync_ticker(&mut self) {
        match (&self.state.auction, &self.ticker) {
            (Some(_), None) => {
                let period = self.ctx.auction_tick;
                let mut interval = interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(interval);
                tracing::debug!(room_id = %self.room_id, "auction timer started");
            }
            (None, Some(_)) => {
                self.ticker = None;
                tracing::debug!(room_id = %self.room_id, "auction timer stopped");
            }
            _ => {}
        }
    }

    fn broadcast_state(&self) {
        let message = ServerMessage::state(&self.room_id, &self.state);
        self.ctx.broadcaster.to_room(&self.room_id, &message);
    }
}
