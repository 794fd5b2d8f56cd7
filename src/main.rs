//! EvPulse - EV registration analytics
//!
//! A CLI tool that reads a JSON export of vehicle registration records
//! and writes summary views (rankings, shares, histograms, geographic
//! density and make/model breakdowns) as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable dataset, invalid config, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{Dashboard, Report, ReportMetadata};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so [general].verbose can set the level
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("EvPulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config.general);

    if let Err(e) = run(args, config) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .evpulse.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Add [reference] tables for districts, utilities and eligibility.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load the dataset, build every view and write the report.
fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let options = config.dashboard_options()?;

    let input = args
        .input
        .clone()
        .context("An --input file is required")?;

    if !args.quiet {
        println!("📥 Loading records: {}", input.display());
    }
    let loaded = source::load_records(
        &input,
        &source::LoadOptions {
            show_progress: !args.quiet,
        },
    )?;

    if loaded.records.is_empty() {
        warn!("Dataset contains no records; every view will be empty");
    }

    if args.dry_run {
        let summary = analysis::metrics::summarize(&loaded.records);
        println!("\n🔍 Dry run: {} records loaded", loaded.records.len());
        println!(
            "   BEV: {} | PHEV: {} | Avg. range: {} mi",
            summary.bev_count, summary.phev_count, summary.avg_range
        );
        println!("\n✅ Dry run complete. No report was written.");
        return Ok(());
    }

    if !args.quiet {
        println!("🔬 Aggregating...");
    }
    let dashboard = Dashboard::build(&loaded.records, &options, &config.reference);

    let report = Report {
        metadata: ReportMetadata {
            source: input.display().to_string(),
            generated_at: Utc::now(),
            records_loaded: loaded.records.len(),
            records_skipped: loaded.skipped,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        dashboard,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    let summary = &report.dashboard.summary;
    println!("\n📊 Summary:");
    println!("   Vehicles: {}", summary.total_count);
    println!(
        "   - BEV: {} | PHEV: {} | Avg. range: {} mi",
        summary.bev_count, summary.phev_count, summary.avg_range
    );
    println!("   Duration: {:.2}s", report.metadata.duration_seconds);
    println!("\n✅ Report saved to: {}", output_path.display());

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before the tracing subscriber exists, so problems go to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            if !args.quiet {
                eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            }
            Ok(Config::default())
        }
    }
}
