//! Model-year trend and range leaderboard.

use crate::models::{Field, ModelRange, VehicleRecord, YearCount};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Registrations per model year, oldest first.
///
/// Years before `min_year` are left out.
pub fn year_trend(records: &[VehicleRecord], min_year: i64) -> Vec<YearCount> {
    let mut years: BTreeMap<i64, u64> = BTreeMap::new();

    for year in records.iter().filter_map(|r| r.integer(Field::ModelYear)) {
        *years.entry(year).or_default() += 1;
    }

    years
        .range(min_year..)
        .map(|(&year, &count)| YearCount { year, count })
        .collect()
}

/// Thresholds for the range leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderOptions {
    /// Vehicles with a positive range a model needs to be ranked.
    pub min_vehicles: u64,
    pub limit: usize,
}

/// Make/model pairs ranked by average positive electric range, highest first.
///
/// Pairs are keyed `"<Make> <Model>"` with `N/A` standing in for a missing
/// part. Ties on the average keep first-appearance order.
pub fn range_leaders(records: &[VehicleRecord], options: LeaderOptions) -> Vec<ModelRange> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sums: Vec<(String, f64, u64)> = Vec::new();

    for record in records {
        let Some(range) = record.number(Field::ElectricRange).filter(|r| *r > 0.0) else {
            continue;
        };
        let make = record.text(Field::Make);
        let model = record.text(Field::Model);
        let key = format!(
            "{} {}",
            make.as_deref().unwrap_or("N/A"),
            model.as_deref().unwrap_or("N/A")
        );

        match index.get(&key) {
            Some(&i) => {
                sums[i].1 += range;
                sums[i].2 += 1;
            }
            None => {
                index.insert(key.clone(), sums.len());
                sums.push((key, range, 1));
            }
        }
    }

    let mut leaders: Vec<ModelRange> = sums
        .into_iter()
        .filter(|(_, _, count)| *count >= options.min_vehicles)
        .map(|(model_key, sum, count)| ModelRange {
            model_key,
            avg_range: sum / count as f64,
            vehicle_count: count,
        })
        .collect();

    leaders.sort_by(|a, b| b.avg_range.total_cmp(&a.avg_range));
    leaders.truncate(options.limit);

    debug!("Range leaders: {} models ranked", leaders.len());

    leaders
}
