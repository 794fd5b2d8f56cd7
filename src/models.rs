//! Data models for the registration analytics.
//!
//! This module contains the record type read from the dataset and every
//! aggregate structure produced by the analysis layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// A field the analysis reads from a vehicle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    City,
    County,
    VehicleLocation,
    ElectricVehicleType,
    ModelYear,
    ElectricRange,
    Make,
    Model,
}

impl Field {
    /// Verbatim key of the field in a record.
    pub fn name(&self) -> &'static str {
        match self {
            Field::City => "City",
            Field::County => "County",
            Field::VehicleLocation => "VehicleLocation",
            Field::ElectricVehicleType => "ElectricVehicleType",
            Field::ModelYear => "ModelYear",
            Field::ElectricRange => "ElectricRange",
            Field::Make => "Make",
            Field::Model => "Model",
        }
    }

    /// Header used by the published dataset export, where it differs.
    fn alias(&self) -> Option<&'static str> {
        match self {
            Field::VehicleLocation => Some("Vehicle Location"),
            Field::ElectricVehicleType => Some("Electric Vehicle Type"),
            Field::ModelYear => Some("Model Year"),
            Field::ElectricRange => Some("Electric Range"),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single registration record.
///
/// Records are untrusted: any field may be missing, null, or of an
/// unexpected JSON type. The accessors below coerce values and return
/// `None` for anything they cannot interpret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleRecord {
    fields: Map<String, Value>,
}

impl VehicleRecord {
    /// Wrap an already-parsed JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw value of a field. Null counts as absent.
    pub fn raw(&self, field: Field) -> Option<&Value> {
        let present = |key: &str| self.fields.get(key).filter(|v| !v.is_null());

        present(field.name()).or_else(|| field.alias().and_then(present))
    }

    /// Field as non-empty text. Numbers are rendered as text.
    pub fn text(&self, field: Field) -> Option<Cow<'_, str>> {
        match self.raw(field)? {
            Value::String(s) if !s.is_empty() => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }

    /// Field as a finite float.
    pub fn number(&self, field: Field) -> Option<f64> {
        let value = match self.raw(field)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };

        value.is_finite().then_some(value)
    }

    /// Field as an integer. Strings contribute their leading digit run.
    pub fn integer(&self, field: Field) -> Option<i64> {
        match self.raw(field)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
            Value::String(s) => leading_integer(s.trim()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for VehicleRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Vehicle classification derived from the free-text type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleClass {
    #[serde(rename = "BEV")]
    Bev,
    #[serde(rename = "PHEV")]
    Phev,
    Other,
}

impl VehicleClass {
    /// Classify a raw type string.
    ///
    /// Matching is a case-insensitive substring test, with `BEV` checked
    /// before `PHEV`.
    pub fn classify(raw: &str) -> Self {
        let upper = raw.to_uppercase();
        if upper.contains("BEV") {
            VehicleClass::Bev
        } else if upper.contains("PHEV") {
            VehicleClass::Phev
        } else {
            VehicleClass::Other
        }
    }

    /// Human-readable category name.
    pub fn long_name(&self) -> &'static str {
        match self {
            VehicleClass::Bev => "Battery Electric Vehicle",
            VehicleClass::Phev => "Plug-in Hybrid Electric Vehicle",
            VehicleClass::Other => "Other / Unknown",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleClass::Bev => write!(f, "BEV"),
            VehicleClass::Phev => write!(f, "PHEV"),
            VehicleClass::Other => write!(f, "Other"),
        }
    }
}

/// Sort direction for ranked selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// One key of a tally and the number of times it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub key: String,
    pub count: u64,
}

impl AggregateEntry {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Percentage share of a part over a total.
///
/// `NotApplicable` is produced when the total is zero and serializes as
/// `null`, so it never collides with a real `0.0` share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Share {
    NotApplicable,
    Percent(f64),
}

impl Share {
    #[allow(dead_code)]
    pub fn percent(&self) -> Option<f64> {
        match self {
            Share::Percent(p) => Some(*p),
            Share::NotApplicable => None,
        }
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Share::Percent(p) => write!(f, "{:.1}%", p),
            Share::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// A tally entry together with its share of the tally total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareEntry {
    pub key: String,
    pub count: u64,
    pub share: Share,
}

/// A geographic coordinate parsed from a well-known-text point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// A secondary key kept under a hierarchical node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub secondary_key: String,
    pub count: u64,
}

/// Residual count of the secondary keys cut from a hierarchical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overflow {
    pub count: u64,
}

/// Two-level rollup of one primary key.
///
/// `total` always equals the children's counts plus the overflow count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalNode {
    pub primary_key: String,
    pub total: u64,
    pub children: Vec<ChildEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow: Option<Overflow>,
}

impl HierarchicalNode {
    /// Sum of the children's counts plus the overflow count.
    pub fn accounted(&self) -> u64 {
        let children: u64 = self.children.iter().map(|c| c.count).sum();
        children + self.overflow.map_or(0, |o| o.count)
    }
}

/// A fixed-width histogram bucket covering `[range_start, range_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub range_start: f64,
    pub range_end: f64,
    pub count: u64,
}

/// Registrations for one model year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i64,
    pub count: u64,
}

/// Average electric range of one make/model pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRange {
    pub model_key: String,
    pub avg_range: f64,
    pub vehicle_count: u64,
}

/// A city marker on the density map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMarker {
    pub city: String,
    pub location: GeoPoint,
    pub count: u64,
    /// Area-proportional marker size, `sqrt(count) * scale`.
    pub marker_size: f64,
}

/// City-level geographic density.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityDensity {
    pub cities: Vec<CityMarker>,
    /// Smallest retained count, for color-scale normalization.
    pub min_count: Option<u64>,
    /// Largest retained count.
    pub max_count: Option<u64>,
}

/// Headline totals over the whole dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_count: u64,
    pub bev_count: u64,
    pub phev_count: u64,
    /// Mean positive electric range, rounded to the nearest mile.
    pub avg_range: u64,
}

/// Every aggregate view computed from one record collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub summary: SummaryMetrics,
    pub top_counties: Vec<AggregateEntry>,
    pub vehicle_types: Vec<ShareEntry>,
    pub year_trend: Vec<YearCount>,
    pub range_leaders: Vec<ModelRange>,
    pub make_models: Vec<HierarchicalNode>,
    pub range_distribution: Vec<HistogramBucket>,
    pub city_density: CityDensity,
    pub districts: Vec<AggregateEntry>,
    pub utilities: Vec<ShareEntry>,
    pub eligibility: Vec<ShareEntry>,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Dataset file the records were loaded from.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of records loaded.
    pub records_loaded: usize,
    /// Array elements skipped because they were not objects.
    pub records_skipped: usize,
    /// Time spent loading and aggregating, in seconds.
    pub duration_seconds: f64,
}

/// The complete analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub dashboard: Dashboard,
}

/// Build records from JSON fixtures, dropping anything that is not an object.
#[cfg(test)]
pub fn test_records(values: Vec<Value>) -> Vec<VehicleRecord> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(VehicleRecord::new(map)),
            _ => None,
        })
        .collect()
}
