//! Room configuration, loaded from `ROOMS_`-prefixed environment
//! variables at process startup (see the top-level `kingdoms` crate's
//! `config` module) and passed down to every room this process creates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Mirrors the original service's `AppSettings`, minus the fields that
/// belong to the auth/cabinet services this spec excludes (`sentry_dsn`,
/// `debug`, `internal_url`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How long an idle room's directory blob and replica claim survive.
    pub room_ttl: Duration,
    /// Starting power of a freshly-claimed KING cell.
    pub default_king_power: u32,
    /// Starting power of a CASTLE cell when the map is prepared.
    pub default_castle_power: u32,
    /// Number of distinct colors players can choose between.
    pub colors_count: usize,
    /// This process's identity in the directory's replica index.
    pub replica_id: String,
    /// Alphabet used by the room-key codec.
    pub alphabet: String,
    /// Base URL of the external auth service.
    pub auth_service_url: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room_ttl: Duration::from_secs(86_400),
            default_king_power: 12,
            default_castle_power: 12,
            colors_count: 6,
            replica_id: hostname(),
            alphabet: kingdoms_directory::DEFAULT_ALPHABET.to_string(),
            auth_service_url: "http://localhost:8080".to_string(),
        }
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-replica".to_string())
}

/// Turn cadence: not a whole-number Hz rate (1 / 0.7 s ≈ 1.4286 Hz), so
/// the room's tick loop is built from an explicit period rather than
/// `kingdoms_tick::TickConfig::with_rate`.
pub const TURN_PERIOD: Duration = Duration::from_millis(700);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_original_service_settings() {
        let cfg = RoomConfig::default();
        assert_eq!(cfg.room_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.default_king_power, 12);
        assert_eq!(cfg.default_castle_power, 12);
        assert_eq!(cfg.colors_count, 6);
    }
}
