//! Kingdoms room runtime — process entry point.
//!
//! Ties together the directory (`kingdoms-directory`), auth
//! (`kingdoms-auth`), room (`kingdoms-room`), transport
//! (`kingdoms-transport`) and HTTP admin (`kingdoms-http`) crates into a
//! runnable service: [`config`] loads and validates environment
//! configuration, [`server::Server`] builds and runs the WebSocket
//! accept loop and HTTP admin surface, and [`handler`] drives each
//! connection's handshake and message pump.

pub mod config;
pub mod error;
mod handler;
mod server;

pub use config::AppConfig;
pub use error::ServerError;
pub use server::Server;
