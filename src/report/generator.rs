//! Markdown and JSON report generation.
//!
//! This module renders the aggregate views of a [`Report`] as a Markdown
//! document or as pretty-printed JSON.

use crate::models::{
    AggregateEntry, CityDensity, HierarchicalNode, HistogramBucket, ModelRange, Report,
    ReportMetadata, ShareEntry, SummaryMetrics, VehicleClass, YearCount,
};
use anyhow::Result;
use std::borrow::Cow;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let dashboard = &report.dashboard;
    let mut output = String::new();

    output.push_str("# EV Registration Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&dashboard.summary));
    output.push_str(&generate_count_section(
        "Top Counties",
        "County",
        &dashboard.top_counties,
    ));
    output.push_str(&generate_vehicle_type_section(&dashboard.vehicle_types));
    output.push_str(&generate_year_section(&dashboard.year_trend));
    output.push_str(&generate_range_leaders_section(&dashboard.range_leaders));
    output.push_str(&generate_make_model_section(&dashboard.make_models));
    output.push_str(&generate_histogram_section(&dashboard.range_distribution));
    output.push_str(&generate_density_section(&dashboard.city_density));
    output.push_str(&generate_count_section(
        "Legislative Districts",
        "District",
        &dashboard.districts,
    ));
    output.push_str(&generate_share_section(
        "Electric Utilities",
        "Utility",
        &dashboard.utilities,
    ));
    output.push_str(&generate_share_section(
        "CAFV Eligibility",
        "Status",
        &dashboard.eligibility,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records Loaded:** {}\n",
        metadata.records_loaded
    ));
    if metadata.records_skipped > 0 {
        section.push_str(&format!(
            "- **Entries Skipped:** {}\n",
            metadata.records_skipped
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the headline metrics table.
fn generate_summary_section(summary: &SummaryMetrics) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Total Vehicles | BEV | PHEV | Avg. Range (mi) |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        summary.total_count, summary.bev_count, summary.phev_count, summary.avg_range
    ));

    section
}

/// Escape pipes so a key cannot split a table row.
fn cell(text: &str) -> Cow<'_, str> {
    if text.contains('|') {
        Cow::Owned(text.replace('|', "\\|"))
    } else {
        Cow::Borrowed(text)
    }
}

fn no_data(title: &str) -> String {
    format!("## {}\n\nNo data available.\n\n", title)
}

/// Generate a two-column key/count table.
fn generate_count_section(title: &str, label: &str, entries: &[AggregateEntry]) -> String {
    if entries.is_empty() {
        return no_data(title);
    }

    let mut section = format!("## {}\n\n| {} | Vehicles |\n|:---|---:|\n", title, label);
    for entry in entries {
        section.push_str(&format!("| {} | {} |\n", cell(&entry.key), entry.count));
    }
    section.push('\n');

    section
}

/// Generate a key/count/share table.
fn generate_share_section(title: &str, label: &str, entries: &[ShareEntry]) -> String {
    if entries.is_empty() {
        return no_data(title);
    }

    let mut section = format!(
        "## {}\n\n| {} | Vehicles | Share |\n|:---|---:|---:|\n",
        title, label
    );
    for entry in entries {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            cell(&entry.key),
            entry.count,
            entry.share
        ));
    }
    section.push('\n');

    section
}

/// Generate the vehicle type table with full category names.
fn generate_vehicle_type_section(types: &[ShareEntry]) -> String {
    if types.is_empty() {
        return no_data("Vehicle Types");
    }

    let mut section = String::from(
        "## Vehicle Types\n\n| Type | Description | Vehicles | Share |\n|:---|:---|---:|---:|\n",
    );
    for entry in types {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(&entry.key),
            VehicleClass::classify(&entry.key).long_name(),
            entry.count,
            entry.share
        ));
    }
    section.push('\n');

    section
}

fn generate_year_section(years: &[YearCount]) -> String {
    if years.is_empty() {
        return no_data("Model Year Trend");
    }

    let mut section = String::from("## Model Year Trend\n\n| Year | Registrations |\n|:---|---:|\n");
    for point in years {
        section.push_str(&format!("| {} | {} |\n", point.year, point.count));
    }
    section.push('\n');

    section
}

fn generate_range_leaders_section(leaders: &[ModelRange]) -> String {
    if leaders.is_empty() {
        return no_data("Top Models by Electric Range");
    }

    let mut section = String::from(
        "## Top Models by Electric Range\n\n| Model | Avg. Range (mi) | Vehicles |\n|:---|---:|---:|\n",
    );
    for leader in leaders {
        section.push_str(&format!(
            "| {} | {:.0} | {} |\n",
            cell(&leader.model_key),
            leader.avg_range,
            leader.vehicle_count
        ));
    }
    section.push('\n');

    section
}

/// Generate the make/model breakdown, one row per model.
fn generate_make_model_section(nodes: &[HierarchicalNode]) -> String {
    if nodes.is_empty() {
        return no_data("Makes and Models");
    }

    let mut section =
        String::from("## Makes and Models\n\n| Make | Model | Vehicles |\n|:---|:---|---:|\n");
    for node in nodes {
        section.push_str(&format!(
            "| **{}** | *all models* | **{}** |\n",
            cell(&node.primary_key),
            node.total
        ));
        for child in &node.children {
            section.push_str(&format!(
                "| | {} | {} |\n",
                cell(&child.secondary_key),
                child.count
            ));
        }
        if let Some(overflow) = node.overflow {
            section.push_str(&format!("| | Other Models | {} |\n", overflow.count));
        }
    }
    section.push('\n');

    section
}

fn generate_histogram_section(buckets: &[HistogramBucket]) -> String {
    if buckets.is_empty() {
        return no_data("Electric Range Distribution");
    }

    let mut section = String::from(
        "## Electric Range Distribution\n\n| Range (mi) | Vehicles |\n|:---|---:|\n",
    );
    for bucket in buckets {
        section.push_str(&format!(
            "| {}-{} | {} |\n",
            bucket.range_start, bucket.range_end, bucket.count
        ));
    }
    section.push('\n');

    section
}

fn generate_density_section(density: &CityDensity) -> String {
    if density.cities.is_empty() {
        return no_data("City Density");
    }

    let mut section = String::from("## City Density\n\n");
    if let (Some(min), Some(max)) = (density.min_count, density.max_count) {
        section.push_str(&format!("*Vehicles per city range from {} to {}.*\n\n", min, max));
    }
    section.push_str("| City | Longitude | Latitude | Vehicles | Marker Size |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");
    for city in &density.cities {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {:.2} |\n",
            cell(&city.city),
            city.location.longitude, city.location.latitude, city.count, city.marker_size
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by EvPulse*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
