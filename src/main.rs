//! Decentralization Panel CLI
//!
//! Computes weekly concentration metrics from block and commit events and
//! merges weekly panels into one unified panel.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use decentralization_panel::commands::{
    display_schema, display_version, execute_merge, execute_metrics, validate_merge_args,
    validate_metrics_args, MergeArgs, MetricsArgs,
};
use decentralization_panel::parser::EventFamily;

/// Decentralization Panel - weekly concentration metrics for blockchain platforms
#[derive(Parser, Debug)]
#[command(name = "decentra")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute weekly inverse HHI and Shannon entropy from raw events
    Metrics {
        /// Raw event JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Event family: blocks or commits
        #[arg(short, long, default_value = "blocks")]
        family: EventFamily,

        /// Output path for weekly metric rows
        #[arg(short, long, default_value = "artifacts/weekly_metrics.json")]
        output: PathBuf,

        /// Output path for the mergeable panel
        #[arg(long)]
        panel_output: Option<PathBuf>,

        /// Output path for per-participant weekly shares
        #[arg(long)]
        shares_output: Option<PathBuf>,

        /// Merge config TOML whose platform aliases apply
        #[arg(short, long, env = "DECENTRA_CONFIG")]
        config: Option<PathBuf>,

        /// First day counted (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day counted (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Print per-platform summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Merge weekly panels on (platform, year, week)
    Merge {
        /// Panel JSON files in priority order; missing files are reported and skipped
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output path for the unified panel
        #[arg(short, long, default_value = "artifacts/merged_panel.json")]
        output: PathBuf,

        /// Output path for the merge report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Merge config TOML
        #[arg(short, long, env = "DECENTRA_CONFIG")]
        config: Option<PathBuf>,

        /// Keep the first row of a duplicated key instead of failing
        #[arg(long)]
        keep_first: bool,

        /// Platform to include in a balanced scaffold (repeatable)
        #[arg(long = "scaffold-platform")]
        scaffold_platforms: Vec<String>,

        /// ISO year range for the scaffold, e.g. 2019-2024
        #[arg(long, value_parser = parse_year_range)]
        scaffold_years: Option<(i32, i32)>,

        /// Add a <column>_pct_change companion column (repeatable)
        #[arg(long)]
        pct_change: Vec<String>,

        /// Write the panel as a table that keeps count columns, so it can be merged again
        #[arg(long)]
        table_format: bool,

        /// Print merge report to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Metrics {
            input,
            family,
            output,
            panel_output,
            shares_output,
            config,
            start,
            end,
            summary,
        } => {
            let args = MetricsArgs {
                input,
                family,
                output,
                panel_output,
                shares_output,
                config,
                start,
                end,
                print_summary: summary,
            };

            validate_metrics_args(&args)?;
            execute_metrics(args)?;
        }

        Commands::Merge {
            inputs,
            output,
            report,
            config,
            keep_first,
            scaffold_platforms,
            scaffold_years,
            pct_change,
            table_format,
            summary,
        } => {
            let args = MergeArgs {
                inputs,
                output,
                report,
                config,
                keep_first,
                scaffold_platforms,
                scaffold_years,
                pct_change,
                table_format,
                print_summary: summary,
            };

            validate_merge_args(&args)?;
            execute_merge(args)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Parse `FIRST-LAST` (or a single year) into an inclusive range
fn parse_year_range(value: &str) -> Result<(i32, i32), String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<i32>()
            .map_err(|e| format!("invalid year '{}': {}", s.trim(), e))
    };

    match value.split_once('-') {
        Some((first, last)) => Ok((parse(first)?, parse(last)?)),
        None => {
            let year = parse(value)?;
            Ok((year, year))
        }
    }
}
