//! City-level density markers for the map view.

use crate::analysis::geo::record_location;
use crate::analysis::AnalysisError;
use crate::models::{CityDensity, CityMarker, Field, GeoPoint, VehicleRecord};
use std::collections::HashMap;
use tracing::debug;

/// Parameters for the city rollup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityOptions {
    /// Cities with fewer records are dropped.
    pub min_count: u64,
    /// Multiplier applied to `sqrt(count)` for the marker size.
    pub marker_scale: f64,
}

impl DensityOptions {
    pub fn new(min_count: u64, marker_scale: f64) -> Result<Self, AnalysisError> {
        if !marker_scale.is_finite() || marker_scale < 0.0 {
            return Err(AnalysisError::InvalidMarkerScale(marker_scale));
        }
        Ok(Self {
            min_count,
            marker_scale,
        })
    }
}

impl Default for DensityOptions {
    fn default() -> Self {
        Self {
            min_count: 5,
            marker_scale: 5.0,
        }
    }
}

/// Group records by city and size a marker for each busy city.
///
/// Each city is placed at the first location that parsed for it. Records
/// without a city or with an unparseable location are not counted.
pub fn city_density(records: &[VehicleRecord], options: &DensityOptions) -> CityDensity {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut cities: Vec<(String, GeoPoint, u64)> = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(city) = record.text(Field::City) else {
            skipped += 1;
            continue;
        };
        let Some(point) = record_location(record) else {
            skipped += 1;
            continue;
        };

        match index.get(&*city) {
            Some(&i) => cities[i].2 += 1,
            None => {
                index.insert(city.to_string(), cities.len());
                cities.push((city.into_owned(), point, 1));
            }
        }
    }

    let markers: Vec<CityMarker> = cities
        .into_iter()
        .filter(|(_, _, count)| *count >= options.min_count)
        .map(|(city, location, count)| CityMarker {
            city,
            location,
            count,
            marker_size: (count as f64).sqrt() * options.marker_scale,
        })
        .collect();

    debug!(
        "City density: {} cities retained, {} records skipped",
        markers.len(),
        skipped
    );

    CityDensity {
        min_count: markers.iter().map(|m| m.count).min(),
        max_count: markers.iter().map(|m| m.count).max(),
        cities: markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_records;
    use serde_json::json;

    fn city_records(city: &str, location: &str, n: usize) -> Vec<VehicleRecord> {
        test_records(vec![json!({"City": city, "VehicleLocation": location}); n])
    }

    #[test]
    fn test_threshold_and_sizes() {
        let mut records = city_records("Seattle", "POINT (-122.33 47.61)", 9);
        records.extend(city_records("Yakima", "POINT (-120.5 46.6)", 4));
        records.extend(city_records("Tacoma", "POINT (-122.44 47.25)", 16));

        let density = city_density(&records, &DensityOptions::default());

        let names: Vec<&str> = density.cities.iter().map(|c| c.city.as_str()).collect();
        assert_eq!(names, vec!["Seattle", "Tacoma"]);
        assert_eq!(density.cities[0].marker_size, 15.0);
        assert_eq!(density.cities[1].marker_size, 20.0);
        assert_eq!(density.min_count, Some(9));
        assert_eq!(density.max_count, Some(16));
    }

    #[test]
    fn test_first_parsed_location_wins() {
        let mut records = city_records("Redmond", "not a point", 2);
        records.extend(city_records("Redmond", "POINT (-122.12 47.67)", 3));
        records.extend(city_records("Redmond", "POINT (-100 40)", 3));

        let density = city_density(&records, &DensityOptions::default());

        assert_eq!(density.cities.len(), 1);
        let redmond = &density.cities[0];
        assert_eq!(redmond.count, 6);
        assert_eq!(
            redmond.location,
            GeoPoint {
                longitude: -122.12,
                latitude: 47.67
            }
        );
    }

    #[test]
    fn test_records_without_city_are_skipped() {
        let records = city_records("", "POINT (-122.33 47.61)", 10);
        let density = city_density(&records, &DensityOptions::default());
        assert!(density.cities.is_empty());
        assert_eq!(density.min_count, None);
        assert_eq!(density.max_count, None);
    }

    #[test]
    fn test_invalid_marker_scale() {
        assert!(DensityOptions::new(5, f64::NAN).is_err());
        assert!(DensityOptions::new(5, -1.0).is_err());
        assert!(DensityOptions::new(5, 2.5).is_ok());
    }
}
