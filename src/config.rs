//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.evpulse.toml` files.

use crate::analysis::DashboardOptions;
use crate::cli::{Args, OutputFormat};
use crate::models::{AggregateEntry, SortDirection};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".evpulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation limits and thresholds.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Static reference tables not derivable from the records.
    #[serde(default)]
    pub reference: ReferenceConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "evpulse_report.md".to_string()
}

fn default_json_output() -> String {
    "evpulse_report.json".to_string()
}

/// Limits and thresholds for the individual views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Counties shown in the county ranking.
    #[serde(default = "default_county_limit")]
    pub county_limit: usize,

    /// Models shown in the range leaderboard.
    #[serde(default = "default_top_models_limit")]
    pub top_models_limit: usize,

    /// Vehicles a model needs to enter the range leaderboard.
    #[serde(default = "default_min_model_count")]
    pub min_model_count: u64,

    /// Makes shown in the make/model breakdown.
    #[serde(default = "default_max_makes")]
    pub max_makes: usize,

    /// Models shown per make before the rest is folded into "other".
    #[serde(default = "default_max_models_per_make")]
    pub max_models_per_make: usize,

    /// Vehicles a city needs to appear on the density map.
    #[serde(default = "default_min_city_count")]
    pub min_city_count: u64,

    /// Multiplier for area-proportional map markers.
    #[serde(default = "default_marker_scale")]
    pub marker_scale: f64,

    /// Width of the electric range histogram buckets, in miles.
    #[serde(default = "default_range_bin_width")]
    pub range_bin_width: f64,

    /// Oldest model year kept in the trend.
    #[serde(default = "default_min_model_year")]
    pub min_model_year: i64,

    /// Utilities shown in the utility share view.
    #[serde(default = "default_utility_limit")]
    pub utility_limit: usize,

    /// Order of the legislative district ranking.
    #[serde(default)]
    pub district_sort: SortDirection,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            county_limit: default_county_limit(),
            top_models_limit: default_top_models_limit(),
            min_model_count: default_min_model_count(),
            max_makes: default_max_makes(),
            max_models_per_make: default_max_models_per_make(),
            min_city_count: default_min_city_count(),
            marker_scale: default_marker_scale(),
            range_bin_width: default_range_bin_width(),
            min_model_year: default_min_model_year(),
            utility_limit: default_utility_limit(),
            district_sort: SortDirection::Descending,
        }
    }
}

fn default_county_limit() -> usize {
    15
}

fn default_top_models_limit() -> usize {
    10
}

fn default_min_model_count() -> u64 {
    5
}

fn default_max_makes() -> usize {
    8
}

fn default_max_models_per_make() -> usize {
    3
}

fn default_min_city_count() -> u64 {
    5
}

fn default_marker_scale() -> f64 {
    5.0
}

fn default_range_bin_width() -> f64 {
    25.0
}

fn default_min_model_year() -> i64 {
    1996
}

fn default_utility_limit() -> usize {
    5
}

/// Reference tables supplied alongside the dataset.
///
/// These hold breakdowns the record stream cannot produce (per-district
/// and per-utility counts, eligibility statuses). All are empty unless
/// configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Registrations per legislative district.
    #[serde(default)]
    pub districts: Vec<AggregateEntry>,

    /// Registrations per electric utility.
    #[serde(default)]
    pub utilities: Vec<AggregateEntry>,

    /// Registrations per clean-fuel eligibility status.
    #[serde(default)]
    pub eligibility: Vec<AggregateEntry>,

    /// Display order of the eligibility statuses.
    #[serde(default)]
    pub eligibility_order: Vec<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        } else if args.format == OutputFormat::Json && self.general.output == default_output() {
            self.general.output = default_json_output();
        }

        if let Some(limit) = args.county_limit {
            self.limits.county_limit = limit;
        }
        if let Some(min) = args.min_city_count {
            self.limits.min_city_count = min;
        }
        if let Some(order) = args.district_sort {
            self.limits.district_sort = order.into();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the limits and turn them into validated dashboard options.
    pub fn dashboard_options(&self) -> Result<DashboardOptions> {
        let limits = &self.limits;
        let counts = [
            ("county_limit", limits.county_limit as u64),
            ("top_models_limit", limits.top_models_limit as u64),
            ("max_makes", limits.max_makes as u64),
            ("min_city_count", limits.min_city_count),
            ("utility_limit", limits.utility_limit as u64),
        ];
        for (name, value) in counts {
            if value == 0 {
                anyhow::bail!("limits.{} must be at least 1", name);
            }
        }

        DashboardOptions::try_from(&self.limits).context("Invalid [limits] configuration")
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
