//! Error types for wellsite operations

use thiserror::Error;

/// Main error type for wellsite operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read geometry from {source_id}: {reason}")]
    GeometryRead { source_id: String, reason: String },

    #[error("Malformed row at line {line} in {source_id}: {reason}")]
    MalformedRow {
        source_id: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot project ({x}, {y}): {reason}")]
    Projection { x: f64, y: f64, reason: String },

    #[error("No transformation from {0} to {1}")]
    UnsupportedTransform(String, String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Internal consistency violation: {0}")]
    Consistency(String),
}

/// Result type alias for wellsite operations
pub type Result<T> = std::result::Result<T, Error>;
