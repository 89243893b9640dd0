//! Concurrent handle around a [`GameRoom`].
//!
//! Instead of the channel actor the rest of this crate's siblings favor,
//! a room here is a single `GameRoom` behind a `tokio::sync::Mutex`:
//! every public method locks, mutates state, fans out the resulting
//! broadcasts while still holding the lock (sending on an unbounded
//! channel is cheap and non-blocking), and releases. One lock per room
//! means at most one turn, one connect, or one queued move is ever being
//! applied at a time — the same single-writer guarantee an actor gives,
//! with less plumbing since there's exactly one game to run per room.
//!
//! The tick loop itself only needs to run once no matter how many
//! players' connection tasks call [`RoomHandle::play`] concurrently — a
//! `tokio::sync::watch` channel makes the first caller the one that
//! spawns it, and every caller (including that one) simply awaits the
//! same "game finished" signal.

use std::collections::HashMap;
use std::sync::Arc;

use kingdoms_protocol::{InMessage, OutMessage, PlayerId};
use kingdoms_tick::{TickConfig, TickScheduler};
use tokio::sync::{mpsc, watch, Mutex, Notify};

use crate::classic_game::run_turn;
use crate::config::TURN_PERIOD;
use crate::error::RoomError;
use crate::room::{GameRoom, RoomPhase};

pub type PlayerSender = mpsc::UnboundedSender<OutMessage>;

struct RoomInner {
    room: GameRoom,
    senders: HashMap<PlayerId, PlayerSender>,
    tick_started: bool,
}

impl RoomInner {
    fn send(&self, id: PlayerId, msg: OutMessage) {
        if let Some(tx) = self.senders.get(&id) {
            let _ = tx.send(msg);
        }
    }

    fn broadcast(&self, msg: OutMessage) {
        for id in self.senders.keys().copied().collect::<Vec<_>>() {
            self.send(id, msg.clone());
        }
    }

    fn broadcast_roster(&self) {
        self.broadcast(OutMessage::Players { players: self.room.roster() });
    }
}

/// A live room. Cheap to clone — every clone shares the same underlying
/// state and the same tick loop.
#[derive(Clone)]
pub struct RoomHandle {
    pub room_key: String,
    inner: Arc<Mutex<RoomInner>>,
    ready: Arc<Notify>,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl RoomHandle {
    pub fn new(room: GameRoom) -> Self {
        let room_key = room.room_key.clone();
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            room_key,
            inner: Arc::new(Mutex::new(RoomInner { room, senders: HashMap::new(), tick_started: false })),
            ready: Arc::new(Notify::new()),
            done_tx,
            done_rx,
        }
    }

    pub async fn allow_reconnect(&self) -> bool {
        self.inner.lock().await.room.allow_reconnect()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.room.is_empty()
    }

    pub async fn max_players(&self) -> usize {
        self.inner.lock().await.room.max_players()
    }

    /// Registers `id` in the room and their outbound channel, then
    /// broadcasts the updated roster.
    pub async fn connect(&self, id: PlayerId, nick: String, sender: PlayerSender) -> Result<(), RoomError> {
        let mut inner = self.inner.lock().await;
        inner.room.connect(id, nick)?;
        inner.senders.insert(id, sender);
        inner.broadcast_roster();
        drop(inner);
        self.ready.notify_waiters();
        tracing::debug!(room_key = %self.room_key, player_id = id.0, "player connected");
        Ok(())
    }

    /// Applies one inbound message. `auth` never reaches here — it's
    /// handled by the connection layer before a `RoomHandle` is involved.
    pub async fn handle_message(&self, id: PlayerId, msg: InMessage) {
        let mut inner = self.inner.lock().await;
        match (inner.room.phase, msg) {
            (RoomPhase::Waiting, InMessage::Color { color }) => {
                inner.room.set_color(id, color);
                inner.broadcast_roster();
            }
            (RoomPhase::Waiting, InMessage::Ready) => {
                inner.room.mark_ready(id);
                inner.broadcast_roster();
                drop(inner);
                self.ready.notify_waiters();
                return;
            }
            (RoomPhase::InProgress, InMessage::Move { previous, current }) => {
                inner.room.queue_move(id, previous, current);
            }
            (_, InMessage::Chat(payload)) => {
                inner.broadcast(OutMessage::Chat(payload));
            }
            _ => {}
        }
    }

    /// Removes `id` from the room and re-checks the waiting-room barrier
    /// (so the remaining crowd can still start if everyone else is ready).
    pub async fn disconnect(&self, id: PlayerId) {
        let mut inner = self.inner.lock().await;
        inner.room.disconnect(id);
        inner.senders.remove(&id);
        if inner.room.phase == RoomPhase::Waiting {
            inner.broadcast_roster();
        }
        drop(inner);
        self.ready.notify_waiters();
        tracing::debug!(room_key = %self.room_key, player_id = id.0, "player disconnected");
    }

    /// Blocks until more than one player is present and all are `Ready`,
    /// then transitions the room to `InProgress`. Returns
    /// [`RoomError::NotReady`] if every player leaves before that happens.
    pub async fn wait_all_ready(&self) -> Result<(), RoomError> {
        loop {
            {
                let mut inner = self.inner.lock().await;
                if inner.room.phase != RoomPhase::Waiting {
                    return Ok(());
                }
                if inner.room.is_empty() {
                    return Err(RoomError::NotReady(self.room_key.clone()));
                }
                if inner.room.all_ready() {
                    inner.room.start();
                    return Ok(());
                }
            }
            self.ready.notified().await;
        }
    }

    /// Runs the game to completion. Safe to call from every connected
    /// player's task: only the first call actually drives the tick loop,
    /// the rest just wait on its result — late callers (a player who
    /// connects after the game already finished) see the already-set
    /// `done` signal immediately.
    pub async fn play(&self) {
        let mut done_rx = self.done_rx.clone();
        if *done_rx.borrow() {
            return;
        }

        let should_spawn = {
            let mut inner = self.inner.lock().await;
            if inner.tick_started {
                false
            } else {
                inner.tick_started = true;
                inner.broadcast(OutMessage::Start);
                true
            }
        };

        if should_spawn {
            let handle = self.clone();
            tokio::spawn(async move { handle.run_tick_loop().await });
        }

        let _ = done_rx.changed().await;
    }

    async fn run_tick_loop(&self) {
        tracing::info!(room_key = %self.room_key, "tick loop starting");
        let mut scheduler = TickScheduler::new(TickConfig::with_period(TURN_PERIOD));
        loop {
            scheduler.wait_for_tick().await;

            let (turn, done, empty) = {
                let mut inner = self.inner.lock().await;
                let done = match run_turn(&mut inner.room) {
                    Ok(done) => done,
                    Err(err) => {
                        tracing::error!(room_key = %self.room_key, error = %err, "tick aborted on invariant violation");
                        true
                    }
                };
                let ids: Vec<PlayerId> = inner.room.players.keys().copied().collect();
                for id in ids {
                    if let Some(msg) = inner.room.update_message_for(id) {
                        inner.send(id, msg);
                    }
                }
                if done {
                    inner.room.finish();
                }
                (inner.room.turn, done, inner.room.is_empty())
            };
            tracing::debug!(room_key = %self.room_key, turn, "tick processed");
            scheduler.record_tick_end();

            if done || empty {
                tracing::info!(room_key = %self.room_key, turn, done, empty, "tick loop finished");
                let _ = self.done_tx.send(true);
                break;
            }
        }
    }
}
