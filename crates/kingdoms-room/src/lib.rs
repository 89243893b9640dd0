//! Room lifecycle, turn simulation and matchmaking for the Kingdoms game.
//!
//! A room moves through three phases — `Waiting`, `InProgress`,
//! `Finished` — tracked by [`RoomPhase`] on the pure, synchronous
//! [`GameRoom`] state. [`RoomHandle`] wraps a `GameRoom` for concurrent
//! access from multiple player connections and drives its tick loop once
//! the room starts; [`RoomManager`] resolves room keys against the
//! shared directory (`kingdoms-directory`) so a fleet of replicas can
//! cooperate on who owns which room. [`classic_game::run_turn`] is the
//! per-tick simulation: growth, move resolution, territory settlement,
//! and per-player fog-of-war projection.

mod classic_game;
mod config;
mod error;
mod manager;
mod player;
mod room;
mod runtime;

pub use classic_game::run_turn;
pub use config::{RoomConfig, TURN_PERIOD};
pub use error::RoomError;
pub use manager::RoomManager;
pub use player::{MoveQueue, Player};
pub use room::{GameRoom, RoomPhase};
pub use runtime::{PlayerSender, RoomHandle};
