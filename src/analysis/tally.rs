//! Categorical tallies.

use crate::models::{AggregateEntry, VehicleRecord};
use std::collections::HashMap;
use tracing::debug;

/// Occurrence counts keyed by category, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<AggregateEntry>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`. Empty keys are ignored.
    pub fn observe(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Add `count` occurrences of `key`. Empty keys are ignored.
    pub fn add(&mut self, key: &str, count: u64) {
        if key.is_empty() {
            return;
        }

        match self.index.get(key) {
            Some(&i) => self.entries[i].count += count,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(AggregateEntry::new(key, count));
            }
        }
    }

    /// Build a tally from pre-counted entries, merging repeated keys.
    pub fn from_entries(entries: &[AggregateEntry]) -> Self {
        let mut tally = Self::new();
        for entry in entries {
            tally.add(&entry.key, entry.count);
        }
        tally
    }

    /// Entries in first-appearance order.
    pub fn entries(&self) -> &[AggregateEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AggregateEntry> {
        self.entries
    }

    /// Count for a single key, if seen.
    #[allow(dead_code)]
    pub fn get(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|&i| self.entries[i].count)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }
}

/// Tally records by an extracted key.
///
/// Records whose key is absent or empty are skipped.
pub fn tally_by<'a, F, K>(records: &'a [VehicleRecord], mut extract: F) -> Tally
where
    F: FnMut(&'a VehicleRecord) -> Option<K>,
    K: AsRef<str>,
{
    let mut tally = Tally::new();
    let mut skipped = 0usize;

    for record in records {
        match extract(record) {
            Some(key) if !key.as_ref().is_empty() => tally.observe(key.as_ref()),
            _ => skipped += 1,
        }
    }

    debug!(
        "Tallied {} distinct keys, skipped {} records without a key",
        tally.len(),
        skipped
    );

    tally
}
