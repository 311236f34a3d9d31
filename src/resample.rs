//! Epoch resampling
//!
//! Buckets a sorted time series into fixed-width epochs and averages the
//! values in each epoch. Epoch boundaries are aligned to UTC midnight of the
//! first sample's day, so for widths that divide a day every timestamp is
//! simply floored to the width. Epochs without samples are omitted.

use crate::interval::Interval;
use crate::types::Epoch;
use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Average `values` per epoch of width `interval`.
///
/// `time` must be sorted ascending and have the same length as `values`.
/// NaN values are skipped when averaging; an epoch holding only NaN values
/// has a NaN mean.
pub fn resample_mean(time: &[DateTime<Utc>], values: &[f64], interval: Interval) -> Vec<Epoch> {
    debug_assert_eq!(time.len(), values.len());

    let Some(first) = time.first() else {
        return Vec::new();
    };
    let origin = day_start(first);
    let origin_nanos = nanos_since_epoch(&origin);
    let width = interval.as_nanos() as i128;

    let mut epochs = Vec::new();
    let mut current: Option<Accumulator> = None;

    for (timestamp, &value) in time.iter().zip(values) {
        let bucket = (nanos_since_epoch(timestamp) - origin_nanos).div_euclid(width);

        match current.as_mut() {
            Some(acc) if acc.bucket == bucket => acc.push(value),
            _ => {
                if let Some(done) = current.take() {
                    epochs.push(done.finish(origin, width));
                }
                let mut acc = Accumulator::new(bucket);
                acc.push(value);
                current = Some(acc);
            }
        }
    }

    if let Some(done) = current {
        epochs.push(done.finish(origin, width));
    }

    epochs
}

/// One epoch per sample, for classification without resampling
pub fn per_sample_epochs(time: &[DateTime<Utc>], values: &[f64]) -> Vec<Epoch> {
    time.iter()
        .zip(values)
        .map(|(&start, &mean_enmo)| Epoch {
            start,
            mean_enmo,
            sample_count: 1,
        })
        .collect()
}

struct Accumulator {
    bucket: i128,
    sum: f64,
    valid: usize,
    count: usize,
}

impl Accumulator {
    fn new(bucket: i128) -> Self {
        Self {
            bucket,
            sum: 0.0,
            valid: 0,
            count: 0,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        if !value.is_nan() {
            self.sum += value;
            self.valid += 1;
        }
    }

    fn finish(self, origin: DateTime<Utc>, width: i128) -> Epoch {
        let offset = self.bucket * width;
        let start = origin + Duration::nanoseconds(offset as i64);
        let mean_enmo = if self.valid == 0 {
            f64::NAN
        } else {
            self.sum / self.valid as f64
        };
        Epoch {
            start,
            mean_enmo,
            sample_count: self.count,
        }
    }
}

fn day_start(timestamp: &DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn nanos_since_epoch(timestamp: &DateTime<Utc>) -> i128 {
    timestamp.timestamp() as i128 * 1_000_000_000 + timestamp.timestamp_subsec_nanos() as i128
}
