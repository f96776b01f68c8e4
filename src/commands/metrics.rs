//! Metrics command implementation.
//!
//! The metrics command:
//! 1. Reads raw events
//! 2. Groups them by platform and ISO week
//! 3. Computes concentration metrics per group
//! 4. Writes metric rows (and optionally the panel and shares)

use super::models::MetricsArgs;
use crate::aggregator::{
    metrics_to_panel, summarize_by_platform, AggregatorConfig, DateRange, WeeklyAggregator,
};
use crate::merge::load_merge_config;
use crate::output::{read_events, write_json};
use anyhow::{bail, Context, Result};
use colored::*;
use log::{debug, info};
use std::time::Instant;

/// Execute the metrics command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or malformed event file
/// * Unreadable or invalid config file
/// * File write errors
pub fn execute_metrics(args: MetricsArgs) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Build aggregator settings
    let platform_aliases = match &args.config {
        Some(path) => {
            load_merge_config(path)
                .context("Failed to load config file")?
                .platform_aliases
        }
        None => Default::default(),
    };

    let date_range = match (args.start, args.end) {
        (None, None) => None,
        (start, end) => Some(DateRange::new(
            start.unwrap_or(chrono::NaiveDate::MIN),
            end.unwrap_or(chrono::NaiveDate::MAX),
        )),
    };

    let aggregator = WeeklyAggregator::new(AggregatorConfig {
        platform_aliases,
        date_range,
    });

    // Step 2: Read events
    info!("Step 1/3: Reading events from {}...", args.input.display());
    let events = read_events(&args.input).context("Failed to read event file")?;

    // Step 3: Aggregate
    info!("Step 2/3: Aggregating {} events by ISO week...", events.len());
    let rows = aggregator.aggregate(&events);
    debug!("Built {} weekly rows", rows.len());

    // Step 4: Write outputs
    info!("Step 3/3: Writing output files...");
    write_json(&rows, &args.output).context("Failed to write weekly metrics")?;
    info!("✓ Weekly metrics written to: {}", args.output.display());

    if let Some(path) = &args.panel_output {
        let panel = metrics_to_panel(&rows, args.family);
        write_json(&panel, path).context("Failed to write panel")?;
        info!("✓ Panel written to: {}", path.display());
    }

    if let Some(path) = &args.shares_output {
        let shares = aggregator.participant_shares(&events);
        write_json(&shares, path).context("Failed to write participant shares")?;
        info!("✓ Participant shares written to: {}", path.display());
    }

    if args.print_summary {
        println!("\n📈 {}", "Weekly Concentration Summary".bold());
        println!("---------------------------------------------------");
        for summary in summarize_by_platform(&rows) {
            println!("{}", summary.summary());
        }
        println!("---------------------------------------------------");
    }

    let elapsed = start_time.elapsed();
    info!("Metrics completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Validate metrics arguments before running
pub fn validate_metrics_args(args: &MetricsArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        bail!("Input event file cannot be empty");
    }

    if let (Some(start), Some(end)) = (args.start, args.end) {
        if start > end {
            bail!("Start date {} is after end date {}", start, end);
        }
    }

    Ok(())
}
