//! Per-replica room resolution against the shared directory.
//!
//! A `RoomManager` is the boundary between the stateless fleet of
//! replicas and the stateful room each of them may be running: it loads
//! a room's seed blob at most once per replica, claims it in the
//! sharding index so other replicas reject connections for it, and keeps
//! it cached for the lifetime of the game.

use std::collections::HashMap;

use kingdoms_directory::{DirectoryError, LobbyRepository, RoomRepo, ShardingRepo};
use kingdoms_protocol::PlayerId;
use tokio::sync::Mutex;

use crate::config::RoomConfig;
use crate::error::RoomError;
use crate::room::GameRoom;
use crate::runtime::RoomHandle;

/// Resolves, caches and tears down rooms for one replica.
pub struct RoomManager {
    config: RoomConfig,
    room_repo: RoomRepo,
    sharding: ShardingRepo,
    lobby: LobbyRepository,
    cache: Mutex<HashMap<String, RoomHandle>>,
}

impl RoomManager {
    pub fn new(config: RoomConfig, room_repo: RoomRepo, sharding: ShardingRepo, lobby: LobbyRepository) -> Self {
        Self { config, room_repo, sharding, lobby, cache: Mutex::new(HashMap::new()) }
    }

    /// Resolves `room_key` to a live [`RoomHandle`].
    ///
    /// A cache hit just refreshes this replica's claim in the sharding
    /// index (activity keeps the TTL alive) and returns the cached
    /// handle. A miss checks the sharding index first — if another
    /// replica already owns the room, the caller should reject the
    /// connection rather than materialize a second, diverging copy — then
    /// loads the seed blob, builds the room, claims it, and caches it.
    ///
    /// The whole check-load-construct-insert sequence runs under one
    /// acquisition of `cache`'s lock, not two: holding it only around the
    /// individual `get`/`insert` calls would let two concurrent
    /// first-connections to the same brand-new `room_key` both miss the
    /// cache, both load the blob, and both construct a distinct
    /// `GameRoom`, with the cache silently keeping only one and the other
    /// connection's sender wired to a room nobody's tick loop drives.
    ///
    /// Registers the room in the lobby on the materialization path (the
    /// first connection to ever resolve it on this replica), not at
    /// blob-creation time, so a room posted via the admin surface but
    /// never connected to doesn't show up as joinable, and so `cleanup`
    /// always has a lobby entry to remove.
    pub async fn get_or_create_room(&self, room_key: &str) -> Result<RoomHandle, RoomError> {
        if let Some(owner) = self.sharding.get_room_replica(room_key).await? {
            if owner != self.config.replica_id {
                return Err(RoomError::WrongReplica { room_key: room_key.to_string() });
            }
        }

        let mut cache = self.cache.lock().await;
        if let Some(handle) = cache.get(room_key).cloned() {
            drop(cache);
            self.claim(room_key).await?;
            return Ok(handle);
        }

        let seed = self.room_repo.load_room(room_key).await.map_err(|err| match err {
            DirectoryError::RoomNotFound(key) => RoomError::NotFound(key),
            other => RoomError::Directory(other),
        })?;

        let room = GameRoom::new(room_key.to_string(), self.config.clone(), seed);
        let max_players = room.max_players() as u32;
        let handle = RoomHandle::new(room);
        self.claim(room_key).await?;

        cache.insert(room_key.to_string(), handle.clone());
        drop(cache);

        if let Some(pk) = self.room_repo.pk_of(room_key) {
            if let Err(err) = self.lobby.add_room(room_key, max_players, pk).await {
                tracing::warn!(room_key, error = %err, "failed to register room in lobby at materialization");
            }
        }

        tracing::info!(room_key, replica_id = %self.config.replica_id, "room materialized on this replica");
        Ok(handle)
    }

    async fn claim(&self, room_key: &str) -> Result<(), RoomError> {
        self.sharding
            .set_room_replica(room_key, &self.config.replica_id, self.config.room_ttl.as_secs())
            .await?;
        Ok(())
    }

    /// Runs one player's full lifecycle on an already-resolved room:
    /// bump the lobby seat count, wait for the room to fill up and go
    /// `InProgress` (rolling the seat count back on failure), remove the
    /// now-unjoinable room from the lobby, then drive the game loop.
    pub async fn play_with_room(&self, room: &RoomHandle, _player: PlayerId) -> Result<(), RoomError> {
        self.lobby.adjust_players(&room.room_key, 1).await.ok();

        if let Err(err) = room.wait_all_ready().await {
            self.lobby.adjust_players(&room.room_key, -1).await.ok();
            return Err(err);
        }

        self.lobby.remove_room(&room.room_key).await.ok();
        room.play().await;
        Ok(())
    }

    /// Best-effort teardown, called once a player's connection ends for
    /// any reason. Disconnects them from the room; if that leaves the
    /// room both empty and unable to accept a reconnect, the room is
    /// fully evicted from the directory and this replica's cache.
    pub async fn cleanup(&self, room: &RoomHandle, player: PlayerId) {
        room.disconnect(player).await;

        if !room.allow_reconnect().await && room.is_empty().await {
            if let Err(err) = self.room_repo.remove_room(&room.room_key).await {
                tracing::warn!(room_key = %room.room_key, error = %err, "failed to remove room blob during cleanup");
            }
            if let Err(err) = self.sharding.remove_room_replica(&room.room_key).await {
                tracing::warn!(room_key = %room.room_key, error = %err, "failed to remove replica claim during cleanup");
            }
            let _ = self.lobby.remove_room(&room.room_key).await;
            self.cache.lock().await.remove(&room.room_key);
            tracing::info!(room_key = %room.room_key, "room evicted from replica cache");
        }
    }
}
