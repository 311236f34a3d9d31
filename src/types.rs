//! Core types for the PAAT pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw samples, epochs, per-sample activity labels and the JSON report.

use crate::config::EstimatorConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tri-axial acceleration reading in g, axis order Y, X, Z
pub type Acceleration = [f64; 3];

/// Axis positions inside an [`Acceleration`] (ActiGraph order)
pub mod axis {
    pub const Y: usize = 0;
    pub const X: usize = 1;
    pub const Z: usize = 2;
}

/// A single timestamped acceleration sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelerationSample {
    pub timestamp: DateTime<Utc>,
    pub y: f64,
    pub x: f64,
    pub z: f64,
}

impl AccelerationSample {
    pub fn acceleration(&self) -> Acceleration {
        [self.y, self.x, self.z]
    }
}

/// Activity labels of one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaLevel {
    /// Moderate-to-vigorous physical activity
    pub mvpa: bool,
    /// Sedentary behavior
    pub sb: bool,
}

impl PaLevel {
    /// Labels as a row in column order (MVPA, SB)
    pub fn as_array(&self) -> [bool; 2] {
        [self.mvpa, self.sb]
    }

    /// Neither MVPA nor sedentary
    pub fn is_light(&self) -> bool {
        !self.mvpa && !self.sb
    }
}

/// A resampled time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    /// Start of the bucket (the timestamp labels are matched against)
    pub start: DateTime<Utc>,
    /// Mean ENMO of the samples in the bucket (g)
    pub mean_enmo: f64,
    /// Number of samples that fell into the bucket
    pub sample_count: usize,
}

/// An epoch together with its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEpoch {
    #[serde(flatten)]
    pub epoch: Epoch,
    pub mvpa: bool,
    pub sb: bool,
}

impl ClassifiedEpoch {
    pub fn level(&self) -> PaLevel {
        PaLevel {
            mvpa: self.mvpa,
            sb: self.sb,
        }
    }
}

/// Per-sample output row for line-oriented output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaLevelRecord {
    pub timestamp: DateTime<Utc>,
    pub mvpa: bool,
    pub sb: bool,
}

/// Aggregate label counts over a recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub total_samples: usize,
    pub mvpa_samples: usize,
    pub sb_samples: usize,
    /// Samples that are neither MVPA nor SB
    pub light_samples: usize,
    /// Samples labelled both MVPA and SB (only possible when mvpa_cutpoint <= sb_cutpoint)
    pub overlapping_samples: usize,
    /// Share of samples labelled MVPA (0-1)
    pub mvpa_fraction: f64,
    /// Share of samples labelled SB (0-1)
    pub sb_fraction: f64,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_serial: Option<String>,
    pub first_sample_utc: String,
    pub last_sample_utc: String,
    pub computed_at_utc: String,
}

/// Complete activity report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaReport {
    pub paat_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub config: EstimatorConfig,
    pub summary: ActivitySummary,
    pub epochs: Vec<ClassifiedEpoch>,
}
