//! Merge command implementation.
//! Loads weekly panels, aligns them on `(platform, year, week)` and writes the unified panel.

use super::models::MergeArgs;
use crate::merge::{
    balanced_scaffold, coverage_gaps, load_merge_config, merge_panels, render_terminal_report,
    DuplicatePolicy, MergeConfig, PanelSource,
};
use crate::output::{read_panel, write_json, write_panel, write_panel_table};
use anyhow::{bail, Context, Result};
use colored::*;
use log::{info, warn};
use std::path::Path;

/// Execute the merge command
///
/// An input file that does not exist is treated as an unavailable source:
/// it is listed in the report and the merge continues without it.
pub fn execute_merge(args: MergeArgs) -> Result<()> {
    // Step 1: Load config
    let mut config = if let Some(path) = &args.config {
        load_merge_config(path).context("Failed to load merge config")?
    } else {
        MergeConfig::default()
    };

    if args.keep_first {
        config = config.with_duplicate_policy(DuplicatePolicy::KeepFirst);
    }

    // Step 2: Load panels (scaffold first so it leads the key order)
    let mut sources = Vec::new();

    if let Some((first, last)) = args.scaffold_years {
        let platforms: Vec<&str> = args.scaffold_platforms.iter().map(String::as_str).collect();
        sources.push(PanelSource::from(balanced_scaffold(&platforms, first..=last)));
    }

    for path in &args.inputs {
        sources.push(load_source(path)?);
    }

    // Step 3: Merge
    let outcome = merge_panels(sources, &config).context("Failed to merge panels")?;
    let mut panel = outcome.panel;

    // Step 4: Derived columns
    for column in &args.pct_change {
        panel = panel
            .with_percent_change(column)
            .with_context(|| format!("Failed to add percent change for '{}'", column))?;
    }

    // Step 5: Write outputs
    if args.table_format {
        let source = source_name(&args.output)?;
        write_panel_table(&panel, &source, &args.output)
    } else {
        write_panel(&panel, &args.output)
    }
    .context("Failed to write unified panel")?;
    println!(
        "📊 Unified panel written to {}",
        args.output.display().to_string().cyan()
    );

    if let Some(path) = &args.report {
        write_json(&outcome.report, path).context("Failed to write merge report")?;
        info!("✓ Merge report written to: {}", path.display());
    }

    // Step 6: Terminal summary
    if args.print_summary {
        let gaps = coverage_gaps(&panel);
        println!("{}", render_terminal_report(&outcome.report, &gaps));
    }

    Ok(())
}

/// Validate merge arguments before running
pub fn validate_merge_args(args: &MergeArgs) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("At least one input panel is required");
    }

    match (args.scaffold_years, args.scaffold_platforms.is_empty()) {
        (Some((first, last)), _) if first > last => {
            bail!("Scaffold year range {}..{} is reversed", first, last)
        }
        (Some(_), true) => bail!("A scaffold needs at least one platform"),
        (None, false) => bail!("Scaffold platforms given without a year range"),
        _ => {}
    }

    Ok(())
}

/// Source name for a panel file: its file stem
fn source_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("Cannot derive a source name from {}", path.display()))
}

fn load_source(path: &Path) -> Result<PanelSource> {
    let source = source_name(path)?;

    if !path.exists() {
        warn!(
            "Panel '{}' not found at {}, continuing without it",
            source,
            path.display()
        );
        return Ok(PanelSource::Unavailable {
            source,
            reason: format!("file not found: {}", path.display()),
        });
    }

    let table = read_panel(path, &source)
        .with_context(|| format!("Failed to read panel {}", path.display()))?;
    Ok(PanelSource::Loaded(table))
}
