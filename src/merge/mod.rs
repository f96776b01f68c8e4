//! Panel merge and alignment.
//!
//! This module joins independently produced weekly panels (decentralization,
//! market, proposal diversity, difficulty, ...) on `(platform, year, week)`
//! into one unified panel with exactly one row per key.
//!
//! # Example
//! ```ignore
//! use decentralization_panel::merge::{merge_panels, load_merge_config, PanelSource};
//!
//! let config = load_merge_config("merge.toml")?;
//! let outcome = merge_panels(vec![PanelSource::from(blocks), PanelSource::from(market)], &config)?;
//! println!("{} rows", outcome.panel.len());
//! ```

mod analyzer;
mod config;
mod engine;
mod normalizer;
mod output;
mod scaffold;
mod schema;

// Public API exports
pub use analyzer::coverage_gaps;
pub use config::{
    load_merge_config, parse_merge_config, DuplicatePolicy, KeyColumns, MergeConfig,
    PlatformAliases,
};
pub use engine::{merge_panels, stack_panels, MergeOutcome};
pub use output::render_terminal_report;
pub use scaffold::{balanced_scaffold, iso_weeks_in_year};
pub use schema::{
    Cell, ColumnKind, ColumnRename, ColumnSpec, CoverageGap, DuplicateKey, MergeReport, PanelKey,
    PanelRow, PanelSource, PanelTable, SkippedSource, UnifiedPanel,
};

// Error type
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Panel '{panel}' is missing key columns: {}", .missing.join(", "))]
    SchemaMismatch { panel: String, missing: Vec<String> },

    #[error("Panel '{panel}' has {} duplicated keys: {}", .duplicates.len(), format_duplicates(.duplicates))]
    KeyCollision {
        panel: String,
        duplicates: Vec<DuplicateKey>,
    },

    #[error("Panel '{panel}' row {row}: invalid key ({reason})")]
    InvalidKey {
        panel: String,
        row: usize,
        reason: String,
    },

    #[error("Panel '{panel}' row {row}: expected {expected} cells, found {found}")]
    RaggedRow {
        panel: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Source name '{0}' is used by more than one input panel")]
    DuplicateSource(String),

    #[error("Invalid merge configuration: {0}")]
    Config(#[from] crate::utils::error::ConfigError),
}

fn format_duplicates(duplicates: &[DuplicateKey]) -> String {
    const SHOWN: usize = 5;
    let mut listed: Vec<String> = duplicates
        .iter()
        .take(SHOWN)
        .map(|d| format!("{} (x{})", d.key, d.occurrences))
        .collect();
    if duplicates.len() > SHOWN {
        listed.push(format!("... {} more", duplicates.len() - SHOWN));
    }
    listed.join(", ")
}

#[cfg(test)]
mod tests;
