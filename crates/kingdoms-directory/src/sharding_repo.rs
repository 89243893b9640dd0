//! Replica index: records which process instance owns a room, so a
//! connection that lands on the wrong instance can be rejected with
//! `RoomWrongReplica` instead of silently diverging game state. Ported
//! from the original's `ShardingRepo`.

use redis::AsyncCommands;

use crate::error::DirectoryError;
use crate::redis_manager::RedisManager;

const SHARD_KEY_PREFIX: &str = "__shard:rooms:";

fn shard_redis_key(room_key: &str) -> String {
    format!("{SHARD_KEY_PREFIX}{room_key}")
}

/// Tracks which replica (process instance) owns each live room.
pub struct ShardingRepo {
    redis: RedisManager,
}

impl ShardingRepo {
    pub fn new(redis: RedisManager) -> Self {
        Self { redis }
    }

    /// Returns the replica id that owns `room_key`, if the index entry
    /// hasn't expired.
    pub async fn get_room_replica(&self, room_key: &str) -> Result<Option<String>, DirectoryError> {
        let mut conn = self.redis.connection();
        let replica: Option<String> = conn.get(shard_redis_key(room_key)).await?;
        Ok(replica)
    }

    /// Claims `room_key` for `replica_id`, refreshed with the room's TTL.
    pub async fn set_room_replica(
        &self,
        room_key: &str,
        replica_id: &str,
        ttl_secs: u64,
    ) -> Result<(), DirectoryError> {
        let mut conn = self.redis.connection();
        let _: () = conn
            .set_ex(shard_redis_key(room_key), replica_id, ttl_secs)
            .await?;
        tracing::debug!(room_key, replica_id, "replica claim set");
        Ok(())
    }

    pub async fn remove_room_replica(&self, room_key: &str) -> Result<(), DirectoryError> {
        let mut conn = self.redis.connection();
        let _: () = conn.del(shard_redis_key(room_key)).await?;
        tracing::debug!(room_key, "replica claim removed");
        Ok(())
    }
}
