//! Process configuration, loaded once at startup from `ROOMS_`-prefixed
//! environment variables. Mirrors the original service's
//! `pydantic_settings` `AppSettings` (`env_prefix="rooms_"`): every field
//! has the same default, and a missing required field (the auth service
//! and directory URLs) fails fast at boot instead of surfacing mid-game.

use std::time::Duration;

use kingdoms_room::RoomConfig;
use serde::Deserialize;

use crate::error::ConfigError;

fn default_room_ttl_secs() -> u64 {
    86_400
}

fn default_king_power() -> u32 {
    12
}

fn default_castle_power() -> u32 {
    12
}

fn default_colors_count() -> usize {
    6
}

fn default_alphabet() -> String {
    kingdoms_directory::DEFAULT_ALPHABET.to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Raw shape deserialized from the environment; `room_config()` below
/// turns it into the typed [`RoomConfig`] the room layer actually wants
/// (env vars don't carry a `Duration`, so the TTL crosses as a plain
/// integer of seconds and is converted once, here).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_room_ttl_secs")]
    pub room_ttl_secs: u64,
    #[serde(default = "default_king_power")]
    pub default_king_power: u32,
    #[serde(default = "default_castle_power")]
    pub default_castle_power: u32,
    #[serde(default = "default_colors_count")]
    pub colors_count: usize,
    pub replica_id: Option<String>,
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    pub auth_service_url: String,
    pub redis_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl AppConfig {
    /// Loads and validates configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = envy::prefixed("ROOMS_")
            .from_env()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let distinct: std::collections::HashSet<char> = self.alphabet.chars().collect();
        if distinct.len() < 62 {
            return Err(ConfigError::Invalid(format!(
                "alphabet must have at least 62 distinct characters, got {}",
                distinct.len()
            )));
        }
        if self.room_ttl_secs == 0 {
            return Err(ConfigError::Invalid("room_ttl_secs must be positive".into()));
        }
        if self.default_king_power == 0 || self.default_castle_power == 0 {
            return Err(ConfigError::Invalid("default powers must be positive".into()));
        }
        if self.colors_count == 0 {
            return Err(ConfigError::Invalid("colors_count must be positive".into()));
        }
        url::Url::parse(&self.auth_service_url)
            .map_err(|_| ConfigError::Invalid("auth_service_url must be a valid url".into()))?;
        Ok(())
    }

    /// This process's identity in the directory's replica index —
    /// explicit `replica_id`, falling back to the machine's hostname.
    pub fn replica_id(&self) -> String {
        self.replica_id.clone().unwrap_or_else(hostname)
    }

    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            room_ttl: Duration::from_secs(self.room_ttl_secs),
            default_king_power: self.default_king_power,
            default_castle_power: self.default_castle_power,
            colors_count: self.colors_count,
            replica_id: self.replica_id(),
            alphabet: self.alphabet.clone(),
            auth_service_url: self.auth_service_url.clone(),
        }
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-replica".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
        LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn loads_required_fields_and_applies_defaults() {
        let _guard = env_lock();
        std::env::set_var("ROOMS_AUTH_SERVICE_URL", "http://auth.local");
        std::env::set_var("ROOMS_REDIS_URL", "redis://localhost:6379");
        std::env::remove_var("ROOMS_ROOM_TTL_SECS");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.room_ttl_secs, 86_400);
        assert_eq!(config.default_king_power, 12);
        assert_eq!(config.colors_count, 6);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");

        std::env::remove_var("ROOMS_AUTH_SERVICE_URL");
        std::env::remove_var("ROOMS_REDIS_URL");
    }

    #[test]
    fn rejects_a_short_alphabet() {
        let _guard = env_lock();
        std::env::set_var("ROOMS_AUTH_SERVICE_URL", "http://auth.local");
        std::env::set_var("ROOMS_REDIS_URL", "redis://localhost:6379");
        std::env::set_var("ROOMS_ALPHABET", "short");

        let err = AppConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        std::env::remove_var("ROOMS_AUTH_SERVICE_URL");
        std::env::remove_var("ROOMS_REDIS_URL");
        std::env::remove_var("ROOMS_ALPHABET");
    }

    #[test]
    fn missing_required_field_fails_to_load() {
        let _guard = env_lock();
        std::env::remove_var("ROOMS_AUTH_SERVICE_URL");
        std::env::remove_var("ROOMS_REDIS_URL");

        assert!(AppConfig::load().is_err());
    }
}
