//! Room blob storage: the authoritative map + metadata a room is seeded
//! from, keyed by a short room key minted from a monotonic counter.
//! Ported from the original's `RoomRepo`.

use kingdoms_map::MapAndMeta;
use redis::AsyncCommands;

use crate::error::DirectoryError;
use crate::redis_manager::RedisManager;
use crate::room_key::RoomKeyCodec;

const PK_COUNTER_KEY: &str = "__pk:rooms";
const ROOM_KEY_PREFIX: &str = "__rooms:";

fn room_key_redis_key(room_key: &str) -> String {
    format!("{ROOM_KEY_PREFIX}{room_key}")
}

/// Persists and retrieves room blobs in the directory backend.
pub struct RoomRepo {
    redis: RedisManager,
    codec: RoomKeyCodec,
}

impl RoomRepo {
    pub fn new(redis: RedisManager, codec: RoomKeyCodec) -> Self {
        Self { redis, codec }
    }

    /// Mints a fresh room key from `__pk:rooms` and stores `seed` under it
    /// with a TTL, mirroring `save_room`'s `INCR` + `SETEX` pair. Returns
    /// the room key alongside the raw counter value, since the lobby
    /// index uses the latter as its recency score.
    pub async fn save_room(
        &self,
        seed: &MapAndMeta,
        ttl_secs: u64,
    ) -> Result<(String, u64), DirectoryError> {
        let mut conn = self.redis.connection();
        let pk: u64 = conn.incr(PK_COUNTER_KEY, 1).await?;
        let room_key = self.codec.encode(pk)?;
        let blob = serde_json::to_string(&seed.encode())?;
        let _: () = conn
            .set_ex(room_key_redis_key(&room_key), blob, ttl_secs)
            .await?;
        tracing::debug!(room_key, pk, ttl_secs, "room blob saved");
        Ok((room_key, pk))
    }

    /// Loads the blob for `room_key`, or `RoomNotFound` if it's expired or
    /// never existed.
    pub async fn load_room(&self, room_key: &str) -> Result<MapAndMeta, DirectoryError> {
        let mut conn = self.redis.connection();
        let raw: Option<String> = conn.get(room_key_redis_key(room_key)).await?;
        let raw = raw.ok_or_else(|| DirectoryError::RoomNotFound(room_key.to_string()))?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        tracing::debug!(room_key, "room blob loaded");
        Ok(MapAndMeta::decode(value)?)
    }

    /// Removes the blob for `room_key`. Idempotent — removing a key that
    /// doesn't exist is not an error.
    pub async fn remove_room(&self, room_key: &str) -> Result<(), DirectoryError> {
        let mut conn = self.redis.connection();
        let _: () = conn.del(room_key_redis_key(room_key)).await?;
        tracing::debug!(room_key, "room blob removed");
        Ok(())
    }

    /// Recovers the primary key a room key was minted from. Used to
    /// reconstruct the lobby's recency rank when a room is registered at
    /// materialization time rather than at the moment it was created —
    /// the reversibility `RoomKeyCodec` already supports.
    pub fn pk_of(&self, room_key: &str) -> Option<u64> {
        self.codec.decode(room_key)
    }
}
