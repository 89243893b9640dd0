use thiserror::Error;

/// Failures from map/meta construction and validation.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("map must have height and width in [4, 32], got {height}x{width}")]
    InvalidDimensions { height: usize, width: usize },

    #[error("map rows have inconsistent width")]
    RaggedMap,

    #[error("meta must declare at least 2 spawn points, got {0}")]
    NotEnoughSpawns(usize),

    #[error("failed to decode map-and-meta blob: {0}")]
    Decode(#[from] serde_json::Error),
}
