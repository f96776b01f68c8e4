//! Aggregation of raw events into weekly concentration metrics.
//!
//! This module transforms parsed events into:
//! - Weekly metric rows (inverse HHI, Shannon entropy, counts)
//! - Per-participant shares for each week
//! - Per-platform summaries
//! - Mergeable panels for the merge engine

pub mod metrics;
pub mod panel;
pub mod summary;
pub mod weekly_builder;

// Re-export main types and functions
pub use metrics::{
    calculate_concentration, inverse_hhi, shannon_entropy, ConcentrationMetrics, ProportionWarning,
};
pub use panel::{metrics_to_panel, resample_weekly_mean, MeasurementSample};
pub use summary::{summarize_by_platform, PlatformSummary};
pub use weekly_builder::{aggregate_weekly, build_row, AggregatorConfig, DateRange, WeeklyAggregator};
