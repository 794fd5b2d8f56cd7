//! Two-level rollups with an overflow bucket.
//!
//! Records are grouped by a primary key, counted per secondary key, and
//! each group keeps its largest secondary keys. Whatever is cut from a
//! group is folded into its overflow count; groups cut from the result
//! are dropped entirely.

use crate::analysis::ranking::sort_by_count;
use crate::analysis::tally::Tally;
use crate::models::{ChildEntry, HierarchicalNode, Overflow, SortDirection, VehicleRecord};
use std::collections::HashMap;
use tracing::debug;

/// Caps applied to a hierarchical rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyLimits {
    /// Secondary keys kept per primary group (K).
    pub max_children: usize,
    /// Primary groups kept in the result (M).
    pub max_groups: usize,
}

impl Default for HierarchyLimits {
    fn default() -> Self {
        Self {
            max_children: 3,
            max_groups: 8,
        }
    }
}

struct Group {
    key: String,
    secondary: Tally,
}

impl Group {
    fn into_node(self, max_children: usize) -> HierarchicalNode {
        let total = self.secondary.total();
        let distinct = self.secondary.len();

        let mut entries = self.secondary.into_entries();
        sort_by_count(&mut entries, SortDirection::Descending, |e| e.count);
        entries.truncate(max_children);

        let children: Vec<ChildEntry> = entries
            .into_iter()
            .map(|e| ChildEntry {
                secondary_key: e.key,
                count: e.count,
            })
            .collect();

        let kept: u64 = children.iter().map(|c| c.count).sum();
        let residual = total - kept;
        let overflow =
            (distinct > max_children && residual > 0).then_some(Overflow { count: residual });

        let node = HierarchicalNode {
            primary_key: self.key,
            total,
            children,
            overflow,
        };
        debug_assert_eq!(node.total, node.accounted());
        node
    }
}

/// Build the two-level rollup.
///
/// A record contributes only if both its primary and secondary keys are
/// present and non-empty.
pub fn aggregate<'a, P, S, KP, KS>(
    records: &'a [VehicleRecord],
    primary: P,
    secondary: S,
    limits: HierarchyLimits,
) -> Vec<HierarchicalNode>
where
    P: Fn(&'a VehicleRecord) -> Option<KP>,
    S: Fn(&'a VehicleRecord) -> Option<KS>,
    KP: AsRef<str>,
    KS: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        let (Some(p), Some(s)) = (primary(record), secondary(record)) else {
            skipped += 1;
            continue;
        };
        let (p, s) = (p.as_ref(), s.as_ref());
        if p.is_empty() || s.is_empty() {
            skipped += 1;
            continue;
        }

        let slot = match index.get(p) {
            Some(&i) => i,
            None => {
                index.insert(p.to_string(), groups.len());
                groups.push(Group {
                    key: p.to_string(),
                    secondary: Tally::new(),
                });
                groups.len() - 1
            }
        };
        groups[slot].secondary.observe(s);
    }

    debug!(
        "Hierarchy: {} primary groups, {} records skipped",
        groups.len(),
        skipped
    );

    sort_by_count(&mut groups, SortDirection::Descending, |g| g.secondary.total());
    groups.truncate(limits.max_groups);

    groups
        .into_iter()
        .map(|g| g.into_node(limits.max_children))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use crate::models::test_records;
    use serde_json::json;

    fn vehicles(rows: &[(&str, &str, usize)]) -> Vec<VehicleRecord> {
        test_records(
            rows.iter()
                .flat_map(|(make, model, n)| vec![json!({"Make": make, "Model": model}); *n])
                .collect(),
        )
    }

    fn make_model(records: &[VehicleRecord], limits: HierarchyLimits) -> Vec<HierarchicalNode> {
        aggregate(
            records,
            |r| r.text(Field::Make),
            |r| r.text(Field::Model),
            limits,
        )
    }

    #[test]
    fn test_overflow_bucket() {
        let records = vehicles(&[
            ("TESLA", "MODEL Y", 5),
            ("TESLA", "MODEL 3", 3),
            ("TESLA", "MODEL S", 2),
            ("TESLA", "MODEL X", 1),
        ]);

        let nodes = make_model(&records, HierarchyLimits::default());

        assert_eq!(nodes.len(), 1);
        let tesla = &nodes[0];
        assert_eq!(tesla.primary_key, "TESLA");
        assert_eq!(tesla.total, 11);
        let children: Vec<(&str, u64)> = tesla
            .children
            .iter()
            .map(|c| (c.secondary_key.as_str(), c.count))
            .collect();
        assert_eq!(children, vec![("MODEL Y", 5), ("MODEL 3", 3), ("MODEL S", 2)]);
        assert_eq!(tesla.overflow, Some(Overflow { count: 1 }));
    }

    #[test]
    fn test_no_overflow_at_or_below_cap() {
        let records = vehicles(&[("NISSAN", "LEAF", 4), ("NISSAN", "ARIYA", 2), ("KIA", "EV6", 1)]);

        let nodes = make_model(&records, HierarchyLimits::default());

        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.overflow.is_none()));
        assert!(nodes.iter().all(|n| n.total == n.accounted()));
    }

    #[test]
    fn test_group_cap_drops_smallest() {
        let records = vehicles(&[
            ("KIA", "EV6", 2),
            ("TESLA", "MODEL Y", 5),
            ("FORD", "F-150", 2),
            ("BMW", "I3", 1),
        ]);

        let nodes = make_model(
            &records,
            HierarchyLimits {
                max_children: 3,
                max_groups: 2,
            },
        );

        let keys: Vec<&str> = nodes.iter().map(|n| n.primary_key.as_str()).collect();
        // KIA and FORD tie; KIA appeared first.
        assert_eq!(keys, vec!["TESLA", "KIA"]);
    }

    #[test]
    fn test_children_ties_keep_first_appearance() {
        let records = vehicles(&[
            ("CHEVROLET", "VOLT", 2),
            ("CHEVROLET", "BOLT EV", 2),
            ("CHEVROLET", "BOLT EUV", 2),
            ("CHEVROLET", "SPARK", 2),
        ]);

        let nodes = make_model(&records, HierarchyLimits::default());

        let children: Vec<&str> = nodes[0]
            .children
            .iter()
            .map(|c| c.secondary_key.as_str())
            .collect();
        assert_eq!(children, vec!["VOLT", "BOLT EV", "BOLT EUV"]);
        assert_eq!(nodes[0].overflow, Some(Overflow { count: 2 }));
    }

    #[test]
    fn test_invariant_holds_for_every_node() {
        let records = vehicles(&[
            ("A", "a1", 7),
            ("A", "a2", 1),
            ("A", "a3", 4),
            ("A", "a4", 4),
            ("A", "a5", 1),
            ("B", "b1", 3),
            ("C", "c1", 1),
            ("C", "c2", 1),
        ]);

        for max_children in 0..5 {
            let nodes = make_model(
                &records,
                HierarchyLimits {
                    max_children,
                    max_groups: 8,
                },
            );
            for node in &nodes {
                assert_eq!(node.total, node.accounted());
                assert!(node.children.len() <= max_children);
                for pair in node.children.windows(2) {
                    assert!(pair[0].count >= pair[1].count);
                }
            }
        }
    }

    #[test]
    fn test_records_missing_keys_are_skipped() {
        let mut records = vehicles(&[("TESLA", "MODEL 3", 2)]);
        records.extend(test_records(vec![
            json!({"Make": "TESLA"}),
            json!({"Model": "MODEL 3"}),
            json!({"Make": "", "Model": "X"}),
        ]));

        let nodes = make_model(&records, HierarchyLimits::default());

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].total, 2);
    }

    #[test]
    fn test_idempotent() {
        let records = vehicles(&[("A", "x", 3), ("B", "y", 3), ("A", "z", 1)]);
        let first = make_model(&records, HierarchyLimits::default());
        let second = make_model(&records, HierarchyLimits::default());
        assert_eq!(first, second);
    }
}
