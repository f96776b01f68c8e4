//! Per-platform summary statistics over weekly metric rows.

use crate::parser::schema::WeeklyMetricRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of one platform's weekly series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSummary {
    pub platform: String,

    /// Weeks with a metrics row
    pub total_weeks: usize,

    pub mean_inverse_hhi: f64,
    pub mean_shannon_entropy: f64,

    pub total_events: u64,

    pub mean_unique_participants: f64,

    /// First `(ISO year, ISO week)` observed
    pub first_week: (i32, u32),

    /// Last `(ISO year, ISO week)` observed
    pub last_week: (i32, u32),
}

impl PlatformSummary {
    /// Get human-readable summary
    ///
    /// **Public** - for logging and terminal output
    pub fn summary(&self) -> String {
        format!(
            "{} | Weeks: {} ({}-W{:02}..{}-W{:02}) | Inv. HHI: {:.3} | Entropy: {:.3} | Events: {} | Participants/wk: {:.1}",
            self.platform,
            self.total_weeks,
            self.first_week.0,
            self.first_week.1,
            self.last_week.0,
            self.last_week.1,
            self.mean_inverse_hhi,
            self.mean_shannon_entropy,
            self.total_events,
            self.mean_unique_participants
        )
    }
}

/// Summarize weekly rows per platform, sorted by platform
pub fn summarize_by_platform(rows: &[WeeklyMetricRow]) -> Vec<PlatformSummary> {
    let mut by_platform: BTreeMap<&str, Vec<&WeeklyMetricRow>> = BTreeMap::new();
    for row in rows {
        by_platform.entry(row.platform.as_str()).or_default().push(row);
    }

    by_platform
        .into_iter()
        .map(|(platform, rows)| {
            let weeks = rows.len();
            let n = weeks as f64;
            let mean = |f: fn(&WeeklyMetricRow) -> f64| rows.iter().map(|r| f(r)).sum::<f64>() / n;

            let first_week = rows
                .iter()
                .map(|r| (r.year, r.week))
                .min()
                .unwrap_or_default();
            let last_week = rows
                .iter()
                .map(|r| (r.year, r.week))
                .max()
                .unwrap_or_default();

            PlatformSummary {
                platform: platform.to_string(),
                total_weeks: weeks,
                mean_inverse_hhi: mean(|r| r.inverse_hhi),
                mean_shannon_entropy: mean(|r| r.shannon_entropy),
                total_events: rows.iter().map(|r| r.total_events).sum(),
                mean_unique_participants: mean(|r| r.unique_participants as f64),
                first_week,
                last_week,
            }
        })
        .collect()
}
