//! Lobby listing: a sorted set of joinable rooms plus a per-room hash of
//! seat counts, read by the HTTP admin surface's room listing endpoint.
//! Ported from the original's `LobbyRepository`.

use redis::AsyncCommands;
use serde::Serialize;

use crate::error::DirectoryError;
use crate::redis_manager::RedisManager;

const LOBBY_KEY: &str = "lobby:rooms";
const LOBBY_ROOM_PREFIX: &str = "lobby:room:";

fn lobby_room_key(room_key: &str) -> String {
    format!("{LOBBY_ROOM_PREFIX}{room_key}")
}

/// One row of the lobby listing. Serializes with the wire field name
/// `name` for the room key, matching the admin HTTP surface's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    #[serde(rename = "name")]
    pub room_key: String,
    pub max_players: u32,
    pub current_players: u32,
}

/// Maintains the set of rooms visible to `GET /api/v1/rooms/`.
pub struct LobbyRepository {
    redis: RedisManager,
}

impl LobbyRepository {
    pub fn new(redis: RedisManager) -> Self {
        Self { redis }
    }

    /// Adds a newly created room to the lobby, scored by `rank` (the
    /// room's primary key) so listings come back most-recent-first.
    pub async fn add_room(
        &self,
        room_key: &str,
        max_players: u32,
        rank: u64,
    ) -> Result<(), DirectoryError> {
        let mut conn = self.redis.connection();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset(lobby_room_key(room_key), "max_players", max_players)
            .ignore()
            .hset(lobby_room_key(room_key), "current_players", 0u32)
            .ignore()
            .zadd(LOBBY_KEY, room_key, rank)
            .ignore();
        let _: () = pipe.query_async(&mut conn).await?;
        tracing::debug!(room_key, max_players, rank, "room added to lobby");
        Ok(())
    }

    /// Adjusts the seat count for `room_key` by `delta` (+1 on join, -1 on
    /// leave), matching `add_players`/`remove_player`'s shared `HINCRBY`.
    pub async fn adjust_players(&self, room_key: &str, delta: i64) -> Result<(), DirectoryError> {
        let mut conn = self.redis.connection();
        let _: i64 = conn
            .hincr(lobby_room_key(room_key), "current_players", delta)
            .await?;
        Ok(())
    }

    /// Removes a room from the lobby (it either filled up or finished).
    pub async fn remove_room(&self, room_key: &str) -> Result<(), DirectoryError> {
        let mut conn = self.redis.connection();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .zrem(LOBBY_KEY, room_key)
            .ignore()
            .del(lobby_room_key(room_key))
            .ignore();
        let _: () = pipe.query_async(&mut conn).await?;
        tracing::debug!(room_key, "room removed from lobby");
        Ok(())
    }

    /// Lists joinable rooms, most recently created first.
    pub async fn get_rooms(
        &self,
        offset: isize,
        limit: isize,
    ) -> Result<Vec<RoomSummary>, DirectoryError> {
        let mut conn = self.redis.connection();
        let room_keys: Vec<String> = conn
            .zrevrange(LOBBY_KEY, offset, offset + limit.max(1) - 1)
            .await?;

        let mut summaries = Vec::with_capacity(room_keys.len());
        for room_key in room_keys {
            let fields: std::collections::HashMap<String, String> =
                conn.hgetall(lobby_room_key(&room_key)).await?;
            let max_players = fields
                .get("max_players")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let current_players = fields
                .get("current_players")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            summaries.push(RoomSummary {
                room_key,
                max_players,
                current_players,
            });
        }
        Ok(summaries)
    }
}
