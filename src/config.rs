//! Estimator configuration
//!
//! Default cutpoints follow Sanders et al. (2019), "Evaluation of wrist and hip
//! sedentary behaviour and moderate-to-vigorous physical activity raw
//! acceleration cutpoints in older adults", Journal of Sports Sciences 37:11,
//! DOI: 10.1080/02640414.2018.1555904.

use crate::error::PaatError;
use crate::interval::Interval;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default MVPA cutpoint: 69 mg
pub const DEFAULT_MVPA_CUTPOINT: f64 = 0.069;

/// Default sedentary cutpoint: 15 mg
pub const DEFAULT_SB_CUTPOINT: f64 = 0.015;

/// Parameters of the activity level estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Epoch-mean ENMO at or above this value is MVPA (g)
    pub mvpa_cutpoint: f64,
    /// Epoch-mean ENMO at or below this value is sedentary (g)
    pub sb_cutpoint: f64,
    /// Epoch width; `None` classifies every sample on its own
    #[serde(with = "optional_interval")]
    pub interval: Option<Interval>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            mvpa_cutpoint: DEFAULT_MVPA_CUTPOINT,
            sb_cutpoint: DEFAULT_SB_CUTPOINT,
            interval: Some(Interval::ONE_SECOND),
        }
    }
}

impl EstimatorConfig {
    /// Per-sample classification without resampling
    pub fn without_resampling() -> Self {
        Self {
            interval: None,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json(path: &Path) -> Result<Self, PaatError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PaatError> {
        let config: EstimatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PaatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that both cutpoints are usable numbers.
    ///
    /// Cutpoints that let MVPA and SB overlap are accepted; they are only logged.
    pub fn validate(&self) -> Result<(), PaatError> {
        if !self.mvpa_cutpoint.is_finite() {
            return Err(PaatError::InvalidConfig(format!(
                "mvpa_cutpoint must be finite, got {}",
                self.mvpa_cutpoint
            )));
        }
        if !self.sb_cutpoint.is_finite() {
            return Err(PaatError::InvalidConfig(format!(
                "sb_cutpoint must be finite, got {}",
                self.sb_cutpoint
            )));
        }
        if self.mvpa_cutpoint <= self.sb_cutpoint {
            tracing::warn!(
                mvpa_cutpoint = self.mvpa_cutpoint,
                sb_cutpoint = self.sb_cutpoint,
                "mvpa_cutpoint <= sb_cutpoint, samples may be labelled both MVPA and SB"
            );
        }
        Ok(())
    }
}

/// Serializes `None` as `null` and accepts `null`, `""` or an interval string
mod optional_interval {
    use crate::interval::Interval;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Interval>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Interval>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => Interval::parse(&text).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
