//! Fixed-width numeric histograms.

use crate::analysis::AnalysisError;
use crate::models::{HistogramBucket, VehicleRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Narrowest accepted bucket width.
pub const MIN_BIN_WIDTH: f64 = 1e-6;

/// Largest bucket index; indices above it are no longer exact in `f64`.
const MAX_BUCKET_INDEX: f64 = 9_007_199_254_740_992.0;

/// A validated, finite bucket width of at least [`MIN_BIN_WIDTH`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinWidth(f64);

impl BinWidth {
    pub fn new(width: f64) -> Result<Self, AnalysisError> {
        if width.is_finite() && width >= MIN_BIN_WIDTH {
            Ok(Self(width))
        } else {
            Err(AnalysisError::InvalidBinWidth(width))
        }
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

/// Bin positive values into buckets of `width`.
///
/// Non-finite and non-positive values are discarded, as are values too
/// large for their bucket bounds to be represented. Only non-empty buckets
/// are returned, ordered by `range_start`; each holds exactly the values
/// in `[range_start, range_end)`.
pub fn bin_values<I>(values: I, width: BinWidth) -> Vec<HistogramBucket>
where
    I: IntoIterator<Item = f64>,
{
    let w = width.get();
    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    let mut out_of_range = 0usize;

    for value in values {
        if !value.is_finite() || value <= 0.0 {
            continue;
        }
        match bucket_index(value, w) {
            Some(index) => *counts.entry(index).or_default() += 1,
            None => out_of_range += 1,
        }
    }

    if out_of_range > 0 {
        debug!("{} values too large to bin at width {}", out_of_range, w);
    }

    counts
        .into_iter()
        .map(|(index, count)| {
            let range_start = index as f64 * w;
            HistogramBucket {
                range_start,
                range_end: range_start + w,
                count,
            }
        })
        .collect()
}

fn bucket_index(value: f64, width: f64) -> Option<i64> {
    let mut index = (value / width).floor();
    if !(0.0..=MAX_BUCKET_INDEX).contains(&index) {
        return None;
    }

    // Division rounding can land one bucket off.
    if index * width > value {
        index -= 1.0;
    } else if index * width + width <= value {
        index += 1.0;
    }

    let start = index * width;
    let end = start + width;
    (index >= 0.0 && end > start && start <= value && value < end).then_some(index as i64)
}

/// Bin a numeric field extracted from each record.
pub fn bin_by<F>(records: &[VehicleRecord], extract: F, width: BinWidth) -> Vec<HistogramBucket>
where
    F: Fn(&VehicleRecord) -> Option<f64>,
{
    let values: Vec<f64> = records
        .iter()
        .filter_map(&extract)
        .filter(|v| *v > 0.0)
        .collect();

    debug!(
        "Binning {} of {} records at width {}",
        values.len(),
        records.len(),
        width.get()
    );

    bin_values(values, width)
}
