//! Unified error type for the Kingdoms process.
//!
//! Wraps every sub-crate's error so the server/handler code deals with
//! one type instead of importing from each crate individually. `#[from]`
//! on each variant lets `?` convert automatically.

use kingdoms_room::RoomError;
use kingdoms_transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration failed to load or didn't pass validation.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Directory(#[from] kingdoms_directory::DirectoryError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("http server error: {0}")]
    Http(#[source] std::io::Error),
}

/// Raised by [`AppConfig::load`](crate::config::AppConfig::load); kept
/// distinct from [`ServerError`] so config validation can be tested
/// without depending on the room/directory/transport stack.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(msg) => ServerError::Config(msg),
        }
    }
}
