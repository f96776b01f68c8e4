//! Terminal output rendering for merge reports.

use super::schema::{CoverageGap, MergeReport};
use colored::*;

/// Render a human-readable summary of a merge run for the terminal
pub fn render_terminal_report(report: &MergeReport, gaps: &[CoverageGap]) -> String {
    let mut out = String::new();

    out.push_str(&render_header(report));
    out.push_str(&render_sources(report));
    out.push_str(&render_renames(report));
    out.push_str(&render_gaps(gaps));
    out.push_str(&render_status(report));

    out
}

fn render_header(report: &MergeReport) -> String {
    let mut out = String::new();
    out.push_str("\n📊 ");
    out.push_str(&"Panel Merge Summary".bold().to_string());
    out.push_str("\n---------------------------------------------------\n");
    out.push_str(&format!("Rows out:          {}\n", report.rows_out));
    out.push_str(&format!("Zero-filled cells: {}\n", report.zero_filled_cells));
    out.push_str(&format!("Rows missing key:  {}\n", report.rows_missing_key));
    out.push_str("---------------------------------------------------\n");
    out
}

fn render_sources(report: &MergeReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Merged: {}\n", report.sources_merged.join(", ")));
    for skipped in &report.sources_skipped {
        out.push_str(&format!(
            "  {} skipped {}: {}\n",
            "⚠️".yellow(),
            skipped.source,
            skipped.reason
        ));
    }
    out
}

fn render_renames(report: &MergeReport) -> String {
    let mut out = String::new();
    if !report.renamed_columns.is_empty() {
        out.push_str("\nRenamed columns:\n");
        for rename in &report.renamed_columns {
            out.push_str(&format!(
                "  {}: {} -> {}\n",
                rename.source, rename.from, rename.to
            ));
        }
    }
    out
}

fn render_gaps(gaps: &[CoverageGap]) -> String {
    let mut out = String::new();
    if !gaps.is_empty() {
        out.push_str("\nCoverage gaps:\n");
        for gap in gaps.iter().take(10) {
            out.push_str(&format!(
                "  {}: {}-W{:02} .. {}-W{:02} ({} weeks)\n",
                gap.platform, gap.from.year, gap.from.week, gap.to.year, gap.to.week, gap.missing_weeks
            ));
        }
        if gaps.len() > 10 {
            out.push_str(&format!("  ... {} more\n", gaps.len() - 10));
        }
    }
    out
}

fn render_status(report: &MergeReport) -> String {
    let mut out = String::new();
    out.push_str("\n---------------------------------------------------\n");
    let status = if report.duplicates_removed > 0 {
        format!(
            "⚠️  DUPLICATES RESOLVED KEEP-FIRST ({} rows removed, {} keys)",
            report.duplicates_removed,
            report.duplicate_keys.len()
        )
        .yellow()
        .bold()
    } else {
        "✅ KEYS UNIQUE".green().bold()
    };
    out.push_str(&status.to_string());
    out.push('\n');
    out
}
