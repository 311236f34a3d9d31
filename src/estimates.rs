//! Physical activity level estimation
//!
//! Classifies every sample of a recording as moderate-to-vigorous physical
//! activity (MVPA) and/or sedentary behavior (SB):
//!
//! 1. The Euclidean norm minus one (ENMO) is calculated from the tri-axial signal
//! 2. The ENMO is averaged over epochs (1 s by default)
//! 3. Epoch means are compared against the cutpoints (MVPA = 69 mg, SB = 15 mg)
//! 4. Every sample inherits the labels of the epoch at or before it

use crate::asof::asof_index;
use crate::config::EstimatorConfig;
use crate::error::PaatError;
use crate::preprocessing;
use crate::resample;
use crate::types::{Acceleration, ActivitySummary, ClassifiedEpoch, Epoch, PaLevel};
use chrono::{DateTime, Utc};

/// Classify every sample as MVPA and/or SB.
///
/// # Arguments
/// * `time` - Sample timestamps, sorted ascending
/// * `acceleration` - Tri-axial acceleration in g, ActiGraph axis order (Y, X, Z)
/// * `config` - Cutpoints and epoch width
///
/// # Returns
/// One [`PaLevel`] per input sample, in input order
///
/// # Example
/// ```ignore
/// let levels = calculate_pa_levels(&time, &acceleration, &EstimatorConfig::default())?;
/// let mvpa_share = summarize(&levels).mvpa_fraction;
/// ```
pub fn calculate_pa_levels(
    time: &[DateTime<Utc>],
    acceleration: &[Acceleration],
    config: &EstimatorConfig,
) -> Result<Vec<PaLevel>, PaatError> {
    PaLevelEstimator::new(config.clone()).estimate(time, acceleration)
}

/// Reusable estimator holding a validated configuration
#[derive(Debug, Clone, Default)]
pub struct PaLevelEstimator {
    config: EstimatorConfig,
}

impl PaLevelEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Per-sample labels, aligned 1:1 with `time`
    pub fn estimate(
        &self,
        time: &[DateTime<Utc>],
        acceleration: &[Acceleration],
    ) -> Result<Vec<PaLevel>, PaatError> {
        let epochs = self.epochs(time, acceleration)?;
        Ok(self.levels(time, &epochs))
    }

    /// Per-sample labels from an epoch table built by [`Self::epochs`] for the
    /// same `time`.
    ///
    /// Without resampling every sample is its own epoch and labels are copied
    /// 1:1, so samples sharing a timestamp keep their own labels.
    pub fn levels(&self, time: &[DateTime<Utc>], epochs: &[ClassifiedEpoch]) -> Vec<PaLevel> {
        if self.config.interval.is_none() && epochs.len() == time.len() {
            return epochs.iter().map(ClassifiedEpoch::level).collect();
        }
        project_onto_samples(time, epochs)
    }

    /// Epoch table with labels, before projection back onto the samples
    pub fn epochs(
        &self,
        time: &[DateTime<Utc>],
        acceleration: &[Acceleration],
    ) -> Result<Vec<ClassifiedEpoch>, PaatError> {
        self.config.validate()?;
        check_input(time, acceleration)?;

        let enmo = preprocessing::enmo(acceleration);

        let epochs = match self.config.interval {
            Some(interval) => resample::resample_mean(time, &enmo, interval),
            None => resample::per_sample_epochs(time, &enmo),
        };

        tracing::debug!(
            samples = time.len(),
            epochs = epochs.len(),
            interval_secs = ?self.config.interval.map(|i| i.as_secs_f64()),
            "resampled ENMO"
        );

        Ok(epochs
            .into_iter()
            .map(|epoch| classify(epoch, &self.config))
            .collect())
    }
}

/// Label one epoch; both thresholds are inclusive
pub fn classify(epoch: Epoch, config: &EstimatorConfig) -> ClassifiedEpoch {
    let mvpa = epoch.mean_enmo >= config.mvpa_cutpoint;
    let sb = epoch.mean_enmo <= config.sb_cutpoint;
    ClassifiedEpoch { epoch, mvpa, sb }
}

/// Count labels over a recording
pub fn summarize(levels: &[PaLevel]) -> ActivitySummary {
    let mut summary = ActivitySummary {
        total_samples: levels.len(),
        ..ActivitySummary::default()
    };

    for level in levels {
        match (level.mvpa, level.sb) {
            (true, true) => {
                summary.mvpa_samples += 1;
                summary.sb_samples += 1;
                summary.overlapping_samples += 1;
            }
            (true, false) => summary.mvpa_samples += 1,
            (false, true) => summary.sb_samples += 1,
            (false, false) => summary.light_samples += 1,
        }
    }

    if summary.total_samples > 0 {
        let total = summary.total_samples as f64;
        summary.mvpa_fraction = summary.mvpa_samples as f64 / total;
        summary.sb_fraction = summary.sb_samples as f64 / total;
    }

    summary
}

fn check_input(time: &[DateTime<Utc>], acceleration: &[Acceleration]) -> Result<(), PaatError> {
    if time.len() != acceleration.len() {
        return Err(PaatError::LengthMismatch {
            timestamps: time.len(),
            accelerations: acceleration.len(),
        });
    }
    if time.is_empty() {
        return Err(PaatError::EmptyInput);
    }
    if let Some(index) = time.windows(2).position(|pair| pair[1] < pair[0]) {
        return Err(PaatError::UnsortedTimestamps { index: index + 1 });
    }
    Ok(())
}

/// As-of projection of epoch labels onto sample timestamps.
///
/// Samples before the first epoch inherit the first epoch's labels.
pub fn project_onto_samples(time: &[DateTime<Utc>], epochs: &[ClassifiedEpoch]) -> Vec<PaLevel> {
    let starts: Vec<DateTime<Utc>> = epochs.iter().map(|e| e.epoch.start).collect();

    time.iter()
        .map(|timestamp| {
            let index = asof_index(&starts, timestamp).unwrap_or(0);
            epochs
                .get(index)
                .map(ClassifiedEpoch::level)
                .unwrap_or_default()
        })
        .collect()
}
