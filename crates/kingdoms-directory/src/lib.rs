//! Redis-backed directory for the Kingdoms room runtime.
//!
//! A room's authoritative state lives entirely in the process that owns
//! it (see `kingdoms-room`); this crate only stores what's needed to
//! *find* that process and *seed* a room before it starts:
//!
//! - [`RoomRepo`] — the map-and-metadata blob a room is created from.
//! - [`ShardingRepo`] — which replica currently owns a room key.
//! - [`LobbyRepository`] — the public listing of joinable rooms.
//!
//! All three share one [`RedisManager`] connection.

mod error;
mod lobby_repo;
mod redis_manager;
mod room_key;
mod room_repo;
mod sharding_repo;

pub use error::DirectoryError;
pub use lobby_repo::{LobbyRepository, RoomSummary};
pub use redis_manager::RedisManager;
pub use room_key::{RoomKeyCodec, DEFAULT_ALPHABET};
pub use room_repo::RoomRepo;
pub use sharding_repo::ShardingRepo;
