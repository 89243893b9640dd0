//! Wire message types for a Kingdoms room connection.
//!
//! Every message is a JSON object tagged by its `at` field. Inbound and
//! outbound messages are kept as two separate enums (rather than one
//! bidirectional enum) because their variant sets don't overlap except for
//! `auth`, which means something different in each direction: a token
//! going in, a confirmation coming out.

use std::fmt;

use kingdoms_map::GameMap;
use serde::{Deserialize, Serialize};

/// A player identifier, stable across a reconnect within the same room
/// (the spec's `user_id`). Newtype over `u64` so a bare integer can't be
/// passed where a `PlayerId` is expected by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player's status within a room, mirrored verbatim from the original's
/// `PlayerStatus` enum: four terminal-ish states plus the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    NotReady,
    Ready,
    #[serde(rename = "lose")]
    Loser,
    #[serde(rename = "win")]
    Winner,
    #[serde(rename = "stop")]
    Stopped,
}

/// A wire-friendly `{row, col}` pair, distinct from [`kingdoms_map::Point`]
/// so the protocol crate doesn't need to agree on `usize` vs signed
/// indices with the map crate at the type level — moves arrive as plain
/// JSON integers and are range-checked against the map by the room layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireIndex {
    pub row: usize,
    pub col: usize,
}

impl From<WireIndex> for kingdoms_map::Point {
    fn from(w: WireIndex) -> Self {
        kingdoms_map::Point::new(w.row, w.col)
    }
}

impl From<kingdoms_map::Point> for WireIndex {
    fn from(p: kingdoms_map::Point) -> Self {
        WireIndex { row: p.row, col: p.col }
    }
}

/// A chat payload, broadcast verbatim by the room regardless of game
/// state — see the design notes on chat having no dedup or rate limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub user_id: u64,
    pub username: String,
    pub message: String,
    pub timestamp: String,
}

/// Messages a client may send, tagged by `at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum InMessage {
    Auth { token: String },
    Color { color: usize },
    Ready,
    Move {
        previous: Option<WireIndex>,
        current: Option<WireIndex>,
    },
    Chat(ChatPayload),
}

/// Roster entry included in `players` and `update` messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    pub id: u64,
    pub username: String,
    pub color: usize,
    pub status: PlayerStatus,
}

/// Per-player statistics included in an `update` message's `stat` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStat {
    pub fields: usize,
    pub power: u64,
}

/// Messages the server may send, tagged by `at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum OutMessage {
    Auth { status: bool },
    Players { players: Vec<PlayerData> },
    Start,
    Update {
        map: GameMap,
        turn: u64,
        stat: (PlayerData, GameStat),
        #[serde(skip_serializing_if = "Option::is_none")]
        cursor: Option<WireIndex>,
        #[serde(skip_serializing_if = "Option::is_none")]
        prev_cursor: Option<WireIndex>,
    },
    Chat(ChatPayload),
}
