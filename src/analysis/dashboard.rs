//! Composition of every aggregate into one dashboard.
//!
//! Each view is computed independently from the same record slice; none
//! of them feeds another.

use crate::analysis::density::{city_density, DensityOptions};
use crate::analysis::hierarchy::{self, HierarchyLimits};
use crate::analysis::histogram::{bin_by, BinWidth};
use crate::analysis::metrics::summarize;
use crate::analysis::ranking::{rank, RankOptions};
use crate::analysis::ratio::with_shares;
use crate::analysis::tally::{tally_by, Tally};
use crate::analysis::trends::{range_leaders, year_trend, LeaderOptions};
use crate::analysis::AnalysisError;
use crate::config::{LimitsConfig, ReferenceConfig};
use crate::models::{
    AggregateEntry, Dashboard, Field, ShareEntry, SortDirection, VehicleClass, VehicleRecord,
};
use tracing::debug;

/// Validated parameters for building a dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOptions {
    pub county_limit: usize,
    pub top_models: LeaderOptions,
    pub hierarchy: HierarchyLimits,
    pub density: DensityOptions,
    pub range_bin_width: BinWidth,
    pub min_model_year: i64,
    pub utility_limit: usize,
    pub district_sort: SortDirection,
}

impl TryFrom<&LimitsConfig> for DashboardOptions {
    type Error = AnalysisError;

    fn try_from(limits: &LimitsConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            county_limit: limits.county_limit,
            top_models: LeaderOptions {
                min_vehicles: limits.min_model_count,
                limit: limits.top_models_limit,
            },
            hierarchy: HierarchyLimits {
                max_children: limits.max_models_per_make,
                max_groups: limits.max_makes,
            },
            density: DensityOptions::new(limits.min_city_count, limits.marker_scale)?,
            range_bin_width: BinWidth::new(limits.range_bin_width)?,
            min_model_year: limits.min_model_year,
            utility_limit: limits.utility_limit,
            district_sort: limits.district_sort,
        })
    }
}

impl Dashboard {
    /// Compute every view from `records` and the reference tables.
    pub fn build(
        records: &[VehicleRecord],
        options: &DashboardOptions,
        reference: &ReferenceConfig,
    ) -> Self {
        debug!("Building dashboard from {} records", records.len());

        Self {
            summary: summarize(records),
            top_counties: top_counties(records, options.county_limit),
            vehicle_types: vehicle_types(records),
            year_trend: year_trend(records, options.min_model_year),
            range_leaders: range_leaders(records, options.top_models),
            make_models: hierarchy::aggregate(
                records,
                |r| r.text(Field::Make),
                |r| r.text(Field::Model),
                options.hierarchy,
            ),
            range_distribution: bin_by(
                records,
                |r| r.number(Field::ElectricRange),
                options.range_bin_width,
            ),
            city_density: city_density(records, &options.density),
            districts: districts(&reference.districts, options.district_sort),
            utilities: utility_shares(&reference.utilities, options.utility_limit),
            eligibility: eligibility(&reference.eligibility, &reference.eligibility_order),
        }
    }
}

/// Counties with the most registrations.
pub fn top_counties(records: &[VehicleRecord], limit: usize) -> Vec<AggregateEntry> {
    let tally = tally_by(records, |r| r.text(Field::County));
    rank(tally.entries(), &RankOptions::top(limit))
}

/// Distribution of vehicle classes with their shares.
///
/// Records without a type are skipped; unrecognized types count as Other.
pub fn vehicle_types(records: &[VehicleRecord]) -> Vec<ShareEntry> {
    let tally = tally_by(records, |r| {
        r.text(Field::ElectricVehicleType)
            .map(|raw| VehicleClass::classify(&raw).to_string())
    });
    let ranked = rank(
        tally.entries(),
        &RankOptions::ordered(SortDirection::Descending),
    );
    with_shares(&ranked)
}

/// Reference district counts in the requested order.
pub fn districts(table: &[AggregateEntry], direction: SortDirection) -> Vec<AggregateEntry> {
    let tally = Tally::from_entries(table);
    rank(tally.entries(), &RankOptions::ordered(direction))
}

/// Largest utilities and their share of the kept utilities' total.
pub fn utility_shares(table: &[AggregateEntry], limit: usize) -> Vec<ShareEntry> {
    let tally = Tally::from_entries(table);
    with_shares(&rank(tally.entries(), &RankOptions::top(limit)))
}

/// Eligibility statuses in display order with their shares.
///
/// Keys missing from `order` go last, in table order.
pub fn eligibility(table: &[AggregateEntry], order: &[String]) -> Vec<ShareEntry> {
    let mut entries = Tally::from_entries(table).into_entries();
    entries.sort_by_key(|e| {
        order
            .iter()
            .position(|k| *k == e.key)
            .unwrap_or(usize::MAX)
    });
    with_shares(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Share;
    use crate::models::test_records as records;
    use serde_json::json;

    fn default_options() -> DashboardOptions {
        DashboardOptions::try_from(&LimitsConfig::default()).unwrap()
    }

    fn sample() -> Vec<VehicleRecord> {
        let mut values = Vec::new();
        for i in 0..6 {
            values.push(json!({
                "City": "Seattle",
                "County": "King",
                "VehicleLocation": "POINT (-122.33 47.61)",
                "ElectricVehicleType": "Battery Electric Vehicle (BEV)",
                "ModelYear": 2020 + (i % 2),
                "ElectricRange": 200 + i * 10,
                "Make": "TESLA",
                "Model": "MODEL 3",
            }));
        }
        values.push(json!({
            "City": "Olympia",
            "County": "Thurston",
            "VehicleLocation": "POINT (-122.9 47.04)",
            "ElectricVehicleType": "Plug-in Hybrid Electric Vehicle (PHEV)",
            "ModelYear": "2018",
            "ElectricRange": "25",
            "Make": "TOYOTA",
            "Model": "PRIUS PRIME",
        }));
        values.push(json!({"County": null, "ElectricRange": "bad"}));
        records(values)
    }

    #[test]
    fn test_options_reject_invalid_bin_width() {
        let limits = LimitsConfig {
            range_bin_width: 0.0,
            ..LimitsConfig::default()
        };
        assert_eq!(
            DashboardOptions::try_from(&limits),
            Err(AnalysisError::InvalidBinWidth(0.0))
        );
    }

    #[test]
    fn test_options_carry_leaderboard_limits() {
        let limits = LimitsConfig {
            top_models_limit: 3,
            min_model_count: 2,
            ..LimitsConfig::default()
        };
        let options = DashboardOptions::try_from(&limits).unwrap();
        assert_eq!(
            options.top_models,
            LeaderOptions {
                min_vehicles: 2,
                limit: 3
            }
        );
    }

    #[test]
    fn test_build_dashboard() {
        let recs = sample();
        let dashboard = Dashboard::build(&recs, &default_options(), &ReferenceConfig::default());

        assert_eq!(dashboard.summary.total_count, 8);
        assert_eq!(dashboard.summary.bev_count, 6);
        assert_eq!(dashboard.summary.phev_count, 1);
        assert_eq!(dashboard.top_counties[0], AggregateEntry::new("King", 6));
        assert_eq!(dashboard.vehicle_types[0].key, "BEV");
        assert_eq!(dashboard.year_trend.len(), 3);
        assert_eq!(dashboard.make_models[0].primary_key, "TESLA");
        assert_eq!(dashboard.range_leaders.len(), 1);
        assert_eq!(dashboard.city_density.cities.len(), 1);
        assert_eq!(dashboard.city_density.cities[0].city, "Seattle");
        let binned: u64 = dashboard.range_distribution.iter().map(|b| b.count).sum();
        assert_eq!(binned, 7);
        assert!(dashboard.districts.is_empty());
        assert!(dashboard.utilities.is_empty());
    }

    #[test]
    fn test_build_is_idempotent() {
        let recs = sample();
        let options = default_options();
        let reference = ReferenceConfig::default();
        assert_eq!(
            Dashboard::build(&recs, &options, &reference),
            Dashboard::build(&recs, &options, &reference)
        );
    }

    #[test]
    fn test_build_empty() {
        let dashboard = Dashboard::build(&[], &default_options(), &ReferenceConfig::default());
        assert_eq!(dashboard.summary.total_count, 0);
        assert!(dashboard.top_counties.is_empty());
        assert!(dashboard.range_distribution.is_empty());
        assert!(dashboard.make_models.is_empty());
    }

    #[test]
    fn test_vehicle_types_shares() {
        let recs = records(vec![
            json!({"ElectricVehicleType": "PHEV"}),
            json!({"ElectricVehicleType": "BEV"}),
            json!({"ElectricVehicleType": "BEV"}),
            json!({"ElectricVehicleType": "BEV"}),
            json!({}),
        ]);

        let types = vehicle_types(&recs);

        assert_eq!(types[0].key, "BEV");
        assert_eq!(types[0].share, Share::Percent(75.0));
        assert_eq!(types[1].key, "PHEV");
        assert_eq!(types[1].share, Share::Percent(25.0));
    }

    #[test]
    fn test_districts_sort_direction() {
        let table = vec![
            AggregateEntry::new("1", 2135),
            AggregateEntry::new("3", 2),
            AggregateEntry::new("11", 3779),
            AggregateEntry::new("40", 2),
        ];

        let desc = districts(&table, SortDirection::Descending);
        let keys: Vec<&str> = desc.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["11", "1", "3", "40"]);

        let asc = districts(&table, SortDirection::Ascending);
        let keys: Vec<&str> = asc.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["3", "40", "1", "11"]);
    }

    #[test]
    fn test_utility_shares_over_kept_total() {
        let table = vec![
            AggregateEntry::new("small", 10),
            AggregateEntry::new("big", 60),
            AggregateEntry::new("mid", 40),
        ];

        let shares = utility_shares(&table, 2);

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].key, "big");
        assert_eq!(shares[0].share, Share::Percent(60.0));
        assert_eq!(shares[1].share, Share::Percent(40.0));
    }

    #[test]
    fn test_eligibility_order() {
        let table = vec![
            AggregateEntry::new("Unknown", 26031),
            AggregateEntry::new("Eligible", 18749),
            AggregateEntry::new("Not Eligible", 5220),
            AggregateEntry::new("Pending", 1),
        ];
        let order: Vec<String> = ["Eligible", "Unknown", "Not Eligible"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let ordered = eligibility(&table, &order);

        let keys: Vec<&str> = ordered.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Eligible", "Unknown", "Not Eligible", "Pending"]);
        let total: f64 = ordered.iter().filter_map(|e| e.share.percent()).sum();
        assert!((total - 100.0).abs() < 0.5);
    }
}
