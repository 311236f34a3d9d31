//! PAAT - Physical activity level estimation from raw wrist accelerometry
//!
//! PAAT turns raw tri-axial accelerometer recordings into per-sample activity
//! labels through a deterministic pipeline: file reading → ENMO → epoch
//! resampling → cutpoint classification → as-of projection onto the samples.
//!
//! ## Modules
//!
//! - **Readers** (`io`): ActiGraph `.gt3x` archives and NDJSON sample files
//! - **Estimator** (`estimates`): MVPA / sedentary behavior labels per sample
//! - **Report** (`encoder`): JSON summary of a processed recording

pub mod asof;
pub mod config;
pub mod encoder;
pub mod error;
pub mod estimates;
pub mod interval;
pub mod io;
pub mod preprocessing;
pub mod resample;
pub mod types;

pub use config::EstimatorConfig;
pub use error::PaatError;
pub use estimates::{calculate_pa_levels, summarize, PaLevelEstimator};
pub use interval::Interval;
pub use io::{read_gt3x, read_ndjson, Recording};
pub use types::{Acceleration, PaLevel};

/// PAAT version embedded in all reports
pub const PAAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "paat";
