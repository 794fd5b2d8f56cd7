//! Headline summary metrics.

use crate::models::{Field, SummaryMetrics, VehicleClass, VehicleRecord};

/// Compute totals, type counts and the mean positive range in one pass.
pub fn summarize(records: &[VehicleRecord]) -> SummaryMetrics {
    let mut metrics = SummaryMetrics {
        total_count: records.len() as u64,
        ..SummaryMetrics::default()
    };
    let mut range_sum = 0.0_f64;
    let mut range_count = 0u64;

    for record in records {
        if let Some(raw) = record.text(Field::ElectricVehicleType) {
            match VehicleClass::classify(&raw) {
                VehicleClass::Bev => metrics.bev_count += 1,
                VehicleClass::Phev => metrics.phev_count += 1,
                VehicleClass::Other => {}
            }
        }

        if let Some(range) = record.number(Field::ElectricRange).filter(|r| *r > 0.0) {
            range_sum += range;
            range_count += 1;
        }
    }

    if range_count > 0 {
        metrics.avg_range = (range_sum / range_count as f64).round() as u64;
    }

    metrics
}
