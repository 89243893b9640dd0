//! Room key codec: turns the monotonic `__pk:rooms` counter into the
//! short, URL-safe key clients see, and back. Ported from the original's
//! `make_room_key`, which wraps the `sqids` library with a custom
//! 62-character alphabet and a 3-character minimum length.

use sqids::Sqids;

use crate::error::DirectoryError;

/// Default alphabet carried over from the original service's settings
/// (`AppSettings.alphabet`). Any reordering changes every existing key,
/// so this must stay pinned unless the directory is also migrated.
pub const DEFAULT_ALPHABET: &str =
    "9Qh1UT6ewJLmGyWHokjIM7NCYfxaS4Zg2PvVEOlFpXt0rc3bDsn8RdiuBAzq5K";

const MIN_LENGTH: u8 = 3;

/// Encodes/decodes the single-integer primary key used to build room keys.
pub struct RoomKeyCodec {
    sqids: Sqids,
}

impl RoomKeyCodec {
    pub fn new(alphabet: &str) -> Result<Self, DirectoryError> {
        let sqids = Sqids::builder()
            .alphabet(alphabet.chars().collect())
            .min_length(MIN_LENGTH)
            .build()
            .map_err(|e| DirectoryError::RoomKey(format!("bad alphabet: {e}")))?;
        Ok(Self { sqids })
    }

    pub fn encode(&self, pk: u64) -> Result<String, DirectoryError> {
        self.sqids
            .encode(&[pk])
            .map_err(|e| DirectoryError::RoomKey(format!("encode failed: {e}")))
    }

    pub fn decode(&self, room_key: &str) -> Option<u64> {
        self.sqids.decode(room_key).first().copied()
    }
}

impl Default for RoomKeyCodec {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHABET).expect("default alphabet is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let codec = RoomKeyCodec::default();
        let key = codec.encode(42).unwrap();
        assert!(key.len() >= MIN_LENGTH as usize);
        assert_eq!(codec.decode(&key), Some(42));
    }

    #[test]
    fn distinct_ids_produce_distinct_keys() {
        let codec = RoomKeyCodec::default();
        let a = codec.encode(1).unwrap();
        let b = codec.encode(2).unwrap();
        assert_ne!(a, b);
    }
}
