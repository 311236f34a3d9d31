//! Raw accelerometer file readers
//!
//! Readers turn a file into a [`Recording`]: sorted timestamps, matching
//! acceleration triples in ActiGraph axis order (Y, X, Z) and whatever
//! metadata the format carries. The estimator only consumes the first two.

mod gt3x;
mod ndjson;

pub use gt3x::{read_gt3x, read_gt3x_from, Gt3xMetadata, Gt3xReader};
pub use ndjson::{read_ndjson, NdjsonReader};

use crate::error::PaatError;
use crate::types::Acceleration;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Samples loaded from a file
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub time: Vec<DateTime<Utc>>,
    pub acceleration: Vec<Acceleration>,
    /// Device metadata, when the format has any
    pub metadata: Option<Gt3xMetadata>,
}

impl Recording {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.time.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.time.last().copied()
    }
}

/// Trait for raw file readers
pub trait RecordingReader {
    /// Short format name for provenance
    fn format(&self) -> &'static str;

    /// Parse an in-memory file
    fn read_bytes(&self, bytes: &[u8]) -> Result<Recording, PaatError>;

    /// Parse a file on disk
    fn read_path(&self, path: &Path) -> Result<Recording, PaatError> {
        let bytes = std::fs::read(path)?;
        self.read_bytes(&bytes)
    }
}
