//! Error types for PAAT

use thiserror::Error;

/// Errors that can occur while reading accelerometer data or estimating
/// activity levels
#[derive(Debug, Error)]
pub enum PaatError {
    #[error("Length mismatch: {timestamps} timestamps but {accelerations} acceleration samples")]
    LengthMismatch {
        timestamps: usize,
        accelerations: usize,
    },

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("No samples to process")]
    EmptyInput,

    #[error("Timestamps are not sorted: sample {index} precedes its predecessor")]
    UnsortedTimestamps { index: usize },

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Missing archive entry: {0}")]
    MissingEntry(String),

    #[error("Invalid metadata: {0}")]
    Metadata(String),

    /// Malformed log record
    #[error("Invalid record at offset {offset}: {message}")]
    Record { offset: usize, message: String },

    #[error("Checksum mismatch at offset {offset}: expected {expected:#04x}, got {got:#04x}")]
    Checksum { offset: usize, expected: u8, got: u8 },
}
