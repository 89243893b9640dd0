use thiserror::Error;

/// Failures from the Redis-backed directory. Every variant maps to a
/// specific recovery action at the call site — see the room manager for
/// that mapping (a wrong-replica owner is read as plain data here and
/// turned into `RoomError::WrongReplica` one layer up).
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("room blob failed to (de)serialize: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("room {0} not found")]
    RoomNotFound(String),

    #[error("room key codec error: {0}")]
    RoomKey(String),
}
