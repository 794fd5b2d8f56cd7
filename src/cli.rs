//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::SortDirection;
use clap::Parser;
use std::path::PathBuf;

/// EvPulse - summary analytics for EV registration data
///
/// Reads a JSON export of vehicle registration records and writes a report
/// of county rankings, type shares, model-year trends, range statistics,
/// make/model breakdowns and city density.
///
/// Examples:
///   evpulse --input Electric_Vehicle_Population_Data.json
///   evpulse --input data.json --format json --output report.json
///   evpulse --input data.json --county-limit 10 --district-sort asc
///   evpulse --input data.json --dry-run
///   evpulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file containing an array of registration records
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present = "init_config",
        env = "EVPULSE_INPUT"
    )]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the [general].output setting, or evpulse_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .evpulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of counties in the county ranking
    #[arg(long, value_name = "COUNT")]
    pub county_limit: Option<usize>,

    /// Minimum vehicles for a city to appear on the density map
    #[arg(long, value_name = "COUNT")]
    pub min_city_count: Option<u64>,

    /// Order of the legislative district ranking (asc, desc)
    #[arg(long, value_name = "ORDER")]
    pub district_sort: Option<SortOrder>,

    /// Dry run: load the records and print the headline metrics only
    ///
    /// No report file is written.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .evpulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Sort order accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for SortDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => SortDirection::Ascending,
            SortOrder::Desc => SortDirection::Descending,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.county_limit == Some(0) {
            return Err("County limit must be at least 1".to_string());
        }

        if self.min_city_count == Some(0) {
            return Err("Minimum city count must be at least 1".to_string());
        }

        match self.input {
            Some(ref input) if !input.is_file() => {
                Err(format!("Input file does not exist: {}", input.display()))
            }
            Some(_) => Ok(()),
            None => Err("An --input file is required".to_string()),
        }
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_default` comes from `[general].verbose`; `--quiet` overrides it.
    pub fn log_level(&self, verbose_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(input: Option<PathBuf>) -> Args {
        Args {
            input,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            county_limit: None,
            min_city_count: None,
            district_sort: None,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_missing_input() {
        let args = make_args(Some(PathBuf::from("/definitely/not/here.json")));
        assert!(args.validate().is_err());

        let args = make_args(None);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_existing_input() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = make_args(Some(file.path().to_path_buf()));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args(Some(file.path().to_path_buf()));
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_limits() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args(Some(file.path().to_path_buf()));
        args.county_limit = Some(0);
        assert!(args.validate().is_err());

        args.county_limit = Some(3);
        args.min_city_count = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args(None);
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(None);
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_sort_order_conversion() {
        assert_eq!(SortDirection::from(SortOrder::Asc), SortDirection::Ascending);
        assert_eq!(SortDirection::from(SortOrder::Desc), SortDirection::Descending);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "evpulse",
            "--input",
            "data.json",
            "--format",
            "json",
            "--district-sort",
            "asc",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("data.json")));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.district_sort, Some(SortOrder::Asc));
    }
}
