//! Thin wrapper around a `redis` connection, mirroring the original
//! service's `RedisManager`: one shared, auto-reconnecting handle built
//! once at startup and cloned into every repository.

use redis::aio::ConnectionManager;
use redis::Client;

use crate::error::DirectoryError;

/// Owns the Redis connection used by every directory repository.
///
/// `redis::aio::ConnectionManager` already retries transparently on
/// connection loss, which is why the original's `retry_on_timeout=True`
/// pool option has no explicit counterpart here — it's the default.
#[derive(Clone)]
pub struct RedisManager {
    manager: ConnectionManager,
}

impl RedisManager {
    /// Connects to `dsn` (a `redis://` URL) and establishes the managed
    /// connection. Fails fast if the initial connection can't be made.
    pub async fn connect(dsn: &str) -> Result<Self, DirectoryError> {
        let client = Client::open(dsn)?;
        let manager = client.get_connection_manager().await?;
        tracing::info!("connected to directory backend");
        Ok(Self { manager })
    }

    /// Returns a cheaply-cloneable connection handle for issuing commands.
    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }
}
