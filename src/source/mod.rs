//! Dataset loading.
//!
//! Reads a JSON export of registration records. The top level must be an
//! array; every object in it becomes a [`VehicleRecord`]. Anything else in
//! the array is skipped and counted.

use crate::models::VehicleRecord;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Options for loading a dataset.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Whether to show a spinner while parsing.
    pub show_progress: bool,
}

/// Records read from a dataset file.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<VehicleRecord>,
    /// Array elements that were not JSON objects.
    pub skipped: usize,
}

/// Load records from a JSON file.
pub fn load_records(path: &Path, options: &LoadOptions) -> Result<LoadedRecords> {
    info!("Loading records from: {}", path.display());

    let spinner = options.show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Parsing {}", path.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    let loaded = parse_records(&content)
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;

    if let Some(pb) = spinner {
        pb.finish_with_message(format!("Loaded {} records", loaded.records.len()));
    }

    info!(
        "Loaded {} records ({} non-object entries skipped)",
        loaded.records.len(),
        loaded.skipped
    );

    Ok(loaded)
}

/// Parse records from JSON text.
pub fn parse_records(content: &str) -> Result<LoadedRecords> {
    let root: Value = serde_json::from_str(content).context("Dataset is not valid JSON")?;

    let Value::Array(items) = root else {
        anyhow::bail!("Dataset must be a JSON array of records");
    };

    let mut loaded = LoadedRecords {
        records: Vec::with_capacity(items.len()),
        skipped: 0,
    };

    for item in items {
        match item {
            Value::Object(fields) => loaded.records.push(VehicleRecord::new(fields)),
            other => {
                debug!("Skipping non-object dataset entry: {}", other);
                loaded.skipped += 1;
            }
        }
    }

    Ok(loaded)
}
