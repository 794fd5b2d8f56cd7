//! Well-known-text point parsing.

use crate::models::{Field, GeoPoint, VehicleRecord};
use once_cell::sync::Lazy;
use regex::Regex;

static POINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"POINT \(([-+]?(?:\d+\.?\d*|\.\d+)) ([-+]?(?:\d+\.?\d*|\.\d+))\)")
        .expect("point pattern is valid")
});

/// Parse `POINT (<lon> <lat>)` into a coordinate.
///
/// Returns `None` when the text does not match or a component is not a
/// finite number. The first number is the longitude.
pub fn parse_point(text: &str) -> Option<GeoPoint> {
    let caps = POINT_PATTERN.captures(text)?;

    let longitude = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let latitude = caps.get(2)?.as_str().parse::<f64>().ok()?;

    if longitude.is_finite() && latitude.is_finite() {
        Some(GeoPoint {
            longitude,
            latitude,
        })
    } else {
        None
    }
}

/// Parse the location field of a record, if present.
pub fn record_location(record: &VehicleRecord) -> Option<GeoPoint> {
    parse_point(&record.text(Field::VehicleLocation)?)
}
