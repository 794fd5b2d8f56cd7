//! Ranked top-N selection over tallies.
//!
//! All sorting here is stable: entries with equal counts keep the order
//! they had in the input, which for a tally is first appearance.

use crate::models::{AggregateEntry, SortDirection};
use std::cmp::Ordering;

/// Parameters for a ranked selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    pub direction: SortDirection,
    /// Entries with a count below this are dropped before sorting.
    pub min_count: Option<u64>,
    /// Maximum number of entries returned.
    pub limit: Option<usize>,
}

impl RankOptions {
    /// Descending order, no threshold, keep at most `limit`.
    pub fn top(limit: usize) -> Self {
        Self {
            direction: SortDirection::Descending,
            min_count: None,
            limit: Some(limit),
        }
    }

    /// Sort in `direction`, keep everything.
    pub fn ordered(direction: SortDirection) -> Self {
        Self {
            direction,
            min_count: None,
            limit: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.min_count = Some(min_count);
        self
    }
}

/// Compare two counts in the requested direction.
pub fn compare_counts(a: u64, b: u64, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => a.cmp(&b),
        SortDirection::Descending => b.cmp(&a),
    }
}

/// Stable-sort `items` by the count `key` returns.
pub fn sort_by_count<T, F>(items: &mut [T], direction: SortDirection, key: F)
where
    F: Fn(&T) -> u64,
{
    items.sort_by(|a, b| compare_counts(key(a), key(b), direction));
}

/// Filter, sort and truncate a tally.
pub fn rank(entries: &[AggregateEntry], options: &RankOptions) -> Vec<AggregateEntry> {
    let mut ranked: Vec<AggregateEntry> = entries
        .iter()
        .filter(|e| options.min_count.map_or(true, |min| e.count >= min))
        .cloned()
        .collect();

    sort_by_count(&mut ranked, options.direction, |e| e.count);

    if let Some(limit) = options.limit {
        ranked.truncate(limit);
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, u64)]) -> Vec<AggregateEntry> {
        pairs
            .iter()
            .map(|(k, c)| AggregateEntry::new(*k, *c))
            .collect()
    }

    fn keys(entries: &[AggregateEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_rank_descending_with_limit() {
        let input = entries(&[("a", 3), ("b", 9), ("c", 1), ("d", 5)]);
        let ranked = rank(&input, &RankOptions::top(2));
        assert_eq!(keys(&ranked), vec!["b", "d"]);
    }

    #[test]
    fn test_rank_ascending() {
        let input = entries(&[("a", 3), ("b", 9), ("c", 1)]);
        let ranked = rank(&input, &RankOptions::ordered(SortDirection::Ascending));
        assert_eq!(keys(&ranked), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let input = entries(&[("x", 2), ("y", 5), ("z", 2), ("w", 5), ("v", 2)]);

        let desc = rank(&input, &RankOptions::ordered(SortDirection::Descending));
        assert_eq!(keys(&desc), vec!["y", "w", "x", "z", "v"]);

        let asc = rank(&input, &RankOptions::ordered(SortDirection::Ascending));
        assert_eq!(keys(&asc), vec!["x", "z", "v", "y", "w"]);
    }

    #[test]
    fn test_min_count_threshold() {
        let input = entries(&[("a", 4), ("b", 5), ("c", 6)]);
        let ranked = rank(&input, &RankOptions::top(10).with_min_count(5));
        assert_eq!(keys(&ranked), vec!["c", "b"]);
    }

    #[test]
    fn test_output_is_monotonic() {
        let input = entries(&[("a", 7), ("b", 1), ("c", 7), ("d", 3), ("e", 0), ("f", 3)]);

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let ranked = rank(&input, &RankOptions::ordered(direction));
            assert_eq!(ranked.len(), input.len());
            for pair in ranked.windows(2) {
                assert_ne!(
                    compare_counts(pair[0].count, pair[1].count, direction),
                    Ordering::Greater
                );
                if pair[0].count == pair[1].count {
                    let first = input.iter().position(|e| e.key == pair[0].key);
                    let second = input.iter().position(|e| e.key == pair[1].key);
                    assert!(first < second);
                }
            }
        }
    }

    #[test]
    fn test_rank_empty_and_zero_limit() {
        assert!(rank(&[], &RankOptions::top(5)).is_empty());
        let input = entries(&[("a", 1)]);
        assert!(rank(&input, &RankOptions::top(0)).is_empty());
    }
}
