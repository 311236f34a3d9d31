//! Epoch width parsing
//!
//! Epoch widths are written as a count followed by a unit, the way pandas
//! offset aliases are written: `"1s"`, `"1 second"`, `"5min"`, `"15S"`,
//! `"100ms"`. An empty string (or `none`) means "no resampling".

use crate::error::PaatError;
use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A strictly positive epoch width
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    nanos: i64,
}

impl Interval {
    /// One-second epochs
    pub const ONE_SECOND: Interval = Interval {
        nanos: 1_000_000_000,
    };

    /// Build an interval from a duration; zero and negative widths are rejected
    pub fn from_duration(duration: Duration) -> Result<Self, PaatError> {
        let nanos = duration.num_nanoseconds().ok_or_else(|| {
            PaatError::InvalidInterval(format!("{duration} overflows nanosecond range"))
        })?;
        if nanos <= 0 {
            return Err(PaatError::InvalidInterval(format!(
                "width must be positive, got {duration}"
            )));
        }
        Ok(Self { nanos })
    }

    pub fn from_secs(secs: i64) -> Result<Self, PaatError> {
        Self::from_duration(Duration::seconds(secs))
    }

    /// Parse an interval string.
    ///
    /// Returns `Ok(None)` for an empty string, `none` or `null`.
    pub fn parse(text: &str) -> Result<Option<Self>, PaatError> {
        let trimmed = text.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("null")
        {
            return Ok(None);
        }

        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (count_text, unit_text) = trimmed.split_at(split);
        let unit_text = unit_text.trim();

        let count: f64 = if count_text.is_empty() {
            1.0
        } else {
            count_text
                .parse()
                .map_err(|_| PaatError::InvalidInterval(format!("bad count in '{text}'")))?
        };

        if unit_text.is_empty() {
            return Err(PaatError::InvalidInterval(format!("missing unit in '{text}'")));
        }

        let unit_nanos = unit_nanos(unit_text)
            .ok_or_else(|| PaatError::InvalidInterval(format!("unknown unit in '{text}'")))?;

        let nanos = (count * unit_nanos as f64).round();
        if !nanos.is_finite() || nanos > i64::MAX as f64 {
            return Err(PaatError::InvalidInterval(format!("'{text}' is too large")));
        }
        if nanos < 1.0 {
            return Err(PaatError::InvalidInterval(format!(
                "width must be positive, got '{text}'"
            )));
        }

        Ok(Some(Self {
            nanos: nanos as i64,
        }))
    }

    pub fn as_nanos(&self) -> i64 {
        self.nanos
    }

    pub fn as_duration(&self) -> Duration {
        Duration::nanoseconds(self.nanos)
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1e9
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::ONE_SECOND
    }
}

fn unit_nanos(unit: &str) -> Option<i64> {
    // Single-letter pandas aliases are case sensitive ("T" minutes, "L" millis)
    let nanos = match unit {
        "ns" | "N" => 1,
        "us" | "U" => 1_000,
        "ms" | "L" => 1_000_000,
        "s" | "S" => 1_000_000_000,
        "min" | "T" => 60_000_000_000,
        "h" | "H" => 3_600_000_000_000,
        "d" | "D" => 86_400_000_000_000,
        _ => match unit.to_ascii_lowercase().as_str() {
            "nanosecond" | "nanoseconds" => 1,
            "microsecond" | "microseconds" => 1_000,
            "millisecond" | "milliseconds" => 1_000_000,
            "sec" | "secs" | "second" | "seconds" => 1_000_000_000,
            "mins" | "minute" | "minutes" => 60_000_000_000,
            "hour" | "hours" => 3_600_000_000_000,
            "day" | "days" => 86_400_000_000_000,
            _ => return None,
        },
    };
    Some(nanos)
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(i64, &str); 6] = [
            (86_400_000_000_000, "d"),
            (3_600_000_000_000, "h"),
            (60_000_000_000, "min"),
            (1_000_000_000, "s"),
            (1_000_000, "ms"),
            (1_000, "us"),
        ];
        for (size, suffix) in UNITS {
            if self.nanos % size == 0 {
                return write!(f, "{}{}", self.nanos / size, suffix);
            }
        }
        write!(f, "{}ns", self.nanos)
    }
}

impl FromStr for Interval {
    type Err = PaatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::parse(s)?
            .ok_or_else(|| PaatError::InvalidInterval(format!("'{s}' does not name a width")))
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
