//! Error types for hitbuilder-core.

use thiserror::Error;

/// Result type alias for hitbuilder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for hitbuilder operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Position lookup outside the populated table.
    #[error("no position for detector {detector}, sub-position {sub} (table is {detectors}x{subs})")]
    PositionOutOfRange {
        detector: usize,
        sub: usize,
        detectors: usize,
        subs: usize,
    },

    /// Hit index outside the event's hit collection.
    #[error("hit index {index} out of range for multiplicity {multiplicity}")]
    HitIndexOutOfRange { index: usize, multiplicity: usize },

    /// Channel id with no entry in the channel map.
    #[error("unknown channel: {0}")]
    UnknownChannel(u32),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Geometry or channel-map document could not be parsed.
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
