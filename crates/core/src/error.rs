//! Error types for Cellscape

use thiserror::Error;

/// Main error type for Cellscape operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty sample: diversity statistics are undefined for zero cells")]
    EmptySample,

    #[error("column length mismatch: expected {expected} rows, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("value '{0}' is not in the category universe")]
    UnknownCategory(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("taxonomy level '{0}' not present in table")]
    MissingLevel(String),

    #[error("no palette available for taxonomy level '{0}'")]
    UnknownLevel(String),

    #[error("cell table has no spatial coordinates")]
    MissingCoordinates,

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("table shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Cellscape operations
pub type Result<T> = std::result::Result<T, Error>;
