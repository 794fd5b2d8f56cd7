//! Percentage shares.

use crate::models::{AggregateEntry, Share, ShareEntry};

/// Share of `part` over `total` as a percentage rounded to one decimal.
///
/// A zero total yields [`Share::NotApplicable`] instead of dividing.
pub fn percentage(part: f64, total: f64) -> Share {
    debug_assert!(part >= 0.0 && total >= 0.0, "shares take non-negative inputs");

    if total == 0.0 {
        return Share::NotApplicable;
    }

    Share::Percent(round_to_tenth(part / total * 100.0))
}

/// Attach each entry's share of the entries' combined count.
pub fn with_shares(entries: &[AggregateEntry]) -> Vec<ShareEntry> {
    let total: u64 = entries.iter().map(|e| e.count).sum();

    entries
        .iter()
        .map(|e| ShareEntry {
            key: e.key.clone(),
            count: e.count,
            share: percentage(e.count as f64, total as f64),
        })
        .collect()
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
