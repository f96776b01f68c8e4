use crate::parser::schema::EventFamily;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Arguments for the metrics command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct MetricsArgs {
    /// Raw event JSON file
    pub input: PathBuf,

    /// Block or commit events
    pub family: EventFamily,

    /// Output path for weekly metric rows
    pub output: PathBuf,

    /// Output path for the mergeable panel (optional)
    pub panel_output: Option<PathBuf>,

    /// Output path for per-participant weekly shares (optional)
    pub shares_output: Option<PathBuf>,

    /// Merge config whose platform aliases are applied before grouping
    pub config: Option<PathBuf>,

    /// First day counted (inclusive)
    pub start: Option<NaiveDate>,

    /// Last day counted (inclusive)
    pub end: Option<NaiveDate>,

    /// Print per-platform summary to stdout
    pub print_summary: bool,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            family: EventFamily::Blocks,
            output: PathBuf::from("weekly_metrics.json"),
            panel_output: None,
            shares_output: None,
            config: None,
            start: None,
            end: None,
            print_summary: false,
        }
    }
}

/// Arguments for the merge command
#[derive(Debug, Clone)]
pub struct MergeArgs {
    /// Panel JSON files, in priority order; the file stem is the source name
    pub inputs: Vec<PathBuf>,

    /// Output path for the unified panel
    pub output: PathBuf,

    /// Output path for the merge report (optional)
    pub report: Option<PathBuf>,

    /// Merge config TOML (optional)
    pub config: Option<PathBuf>,

    /// Resolve duplicate keys keep-first instead of failing
    pub keep_first: bool,

    /// Platforms for a balanced scaffold (requires `scaffold_years`)
    pub scaffold_platforms: Vec<String>,

    /// Inclusive ISO year range for the scaffold
    pub scaffold_years: Option<(i32, i32)>,

    /// Columns that get a `<column>_pct_change` companion
    pub pct_change: Vec<String>,

    /// Write the panel as a table that keeps count columns, not flat records
    pub table_format: bool,

    /// Print merge report to stdout
    pub print_summary: bool,
}

impl Default for MergeArgs {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::from("merged_panel.json"),
            report: None,
            config: None,
            keep_first: false,
            scaffold_platforms: Vec::new(),
            scaffold_years: None,
            pct_change: Vec::new(),
            table_format: false,
            print_summary: false,
        }
    }
}
