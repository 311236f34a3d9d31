//! Newline-delimited JSON samples
//!
//! One object per line: `{"timestamp": "2024-01-15T08:00:00.000Z", "y": 0.01, "x": -0.02, "z": 0.99}`.

use super::{Recording, RecordingReader};
use crate::error::PaatError;
use crate::types::AccelerationSample;
use std::io::BufRead;

/// Read samples from NDJSON; blank lines are skipped
pub fn read_ndjson<R: BufRead>(reader: R) -> Result<Recording, PaatError> {
    let mut recording = Recording::default();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let sample: AccelerationSample = serde_json::from_str(trimmed).map_err(|e| {
            PaatError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;
        recording.time.push(sample.timestamp);
        recording.acceleration.push(sample.acceleration());
    }

    tracing::debug!(samples = recording.len(), "read NDJSON samples");
    Ok(recording)
}

/// [`RecordingReader`] for NDJSON sample files
pub struct NdjsonReader;

impl RecordingReader for NdjsonReader {
    fn format(&self) -> &'static str {
        "ndjson"
    }

    fn read_bytes(&self, bytes: &[u8]) -> Result<Recording, PaatError> {
        read_ndjson(bytes)
    }
}
