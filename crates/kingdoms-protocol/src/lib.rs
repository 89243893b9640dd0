//! Wire protocol for a Kingdoms room connection.
//!
//! This crate defines the "language" clients and the room runtime speak:
//!
//! - **Types** ([`InMessage`], [`OutMessage`], [`PlayerId`], etc.) — the
//!   message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! runtime (player identity, game state). It doesn't know about
//! connections or rooms — it only knows how to serialize and deserialize
//! messages.
//!
//! ```text
//! Transport (bytes) → Protocol (InMessage/OutMessage) → Room (game state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChatPayload, GameStat, InMessage, OutMessage, PlayerData, PlayerId, PlayerStatus, WireIndex,
};
