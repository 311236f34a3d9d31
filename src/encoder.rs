//! Report encoding
//!
//! Bundles the labels of one recording into a [`PaReport`]: producer and
//! provenance metadata, the effective configuration, an activity summary and
//! the classified epoch table.

use crate::config::EstimatorConfig;
use crate::error::PaatError;
use crate::estimates::summarize;
use crate::types::{
    ClassifiedEpoch, PaLevel, PaReport, ReportProducer, ReportProvenance,
};
use crate::{PAAT_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Everything the encoder needs about one processed recording
pub struct EncodeInput<'a> {
    /// Where the samples came from (file name or `stdin`)
    pub source: &'a str,
    pub device_serial: Option<&'a str>,
    pub time: &'a [DateTime<Utc>],
    pub levels: &'a [PaLevel],
    pub epochs: &'a [ClassifiedEpoch],
    pub config: &'a EstimatorConfig,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(&self, input: &EncodeInput<'_>) -> Result<PaReport, PaatError> {
        let (first, last) = match (input.time.first(), input.time.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(PaatError::EmptyInput),
        };

        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: PAAT_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            source: input.source.to_string(),
            device_serial: input.device_serial.map(str::to_string),
            first_sample_utc: first.to_rfc3339(),
            last_sample_utc: last.to_rfc3339(),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        Ok(PaReport {
            paat_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            config: input.config.clone(),
            summary: summarize(input.levels),
            epochs: input.epochs.to_vec(),
        })
    }

    /// Encode to pretty-printed JSON
    pub fn encode_to_json(&self, input: &EncodeInput<'_>) -> Result<String, PaatError> {
        let report = self.encode(input)?;
        serde_json::to_string_pretty(&report).map_err(PaatError::Json)
    }
}
