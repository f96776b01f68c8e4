//! Conversion of weekly series into mergeable panels.

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::merge::{Cell, PanelTable, PlatformAliases};
use crate::parser::schema::{EventFamily, GroupKey, WeeklyMetricRow};
use crate::utils::config::{PLATFORM_COLUMN, WEEK_COLUMN, YEAR_COLUMN};

/// Turn weekly metric rows into a panel with family-prefixed columns
///
/// Columns: `<prefix>_inverse_hhi`, `<prefix>_shannon_entropy` (measures)
/// and `<prefix>_total_events`, `<prefix>_unique_participants` (counts).
pub fn metrics_to_panel(rows: &[WeeklyMetricRow], family: EventFamily) -> PanelTable {
    let prefix = family.prefix();
    let total_events = format!("{}_total_events", prefix);
    let unique_participants = format!("{}_unique_participants", prefix);

    let mut table = PanelTable::new(
        family.source_name(),
        vec![
            PLATFORM_COLUMN.to_string(),
            YEAR_COLUMN.to_string(),
            WEEK_COLUMN.to_string(),
            format!("{}_inverse_hhi", prefix),
            format!("{}_shannon_entropy", prefix),
            total_events.clone(),
            unique_participants.clone(),
        ],
    );
    table.count_columns = vec![total_events, unique_participants];

    for row in rows {
        table.push_row(vec![
            Cell::from(row.platform.as_str()),
            Cell::Number(row.year as f64),
            Cell::Number(row.week as f64),
            Cell::Number(row.inverse_hhi),
            Cell::Number(row.shannon_entropy),
            Cell::from(row.total_events),
            Cell::from(row.unique_participants),
        ]);
    }

    table
}

/// One sub-weekly observation of a measurement (e.g. daily difficulty)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSample {
    pub platform: String,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Average samples per `(platform, ISO year, ISO week)` into a one-column panel
///
/// Pre-aggregating this way keeps the panel at one row per key, so it can
/// be merged without tripping the duplicate-key check. Non-finite samples
/// are ignored.
pub fn resample_weekly_mean(
    samples: &[MeasurementSample],
    source: &str,
    column: &str,
    aliases: &PlatformAliases,
) -> PanelTable {
    let mut sums: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();

    for sample in samples.iter().filter(|s| s.value.is_finite()) {
        let platform = aliases.canonicalize(&sample.platform);
        if platform.is_empty() {
            continue;
        }
        let entry = sums
            .entry(GroupKey::from_timestamp(platform, &sample.timestamp))
            .or_insert((0.0, 0));
        entry.0 += sample.value;
        entry.1 += 1;
    }

    let mut table = PanelTable::new(
        source,
        vec![
            PLATFORM_COLUMN.to_string(),
            YEAR_COLUMN.to_string(),
            WEEK_COLUMN.to_string(),
            column.to_string(),
        ],
    );

    for (key, (sum, count)) in sums {
        table.push_row(vec![
            Cell::from(key.platform.as_str()),
            Cell::Number(key.iso_year as f64),
            Cell::Number(key.iso_week as f64),
            Cell::Number(sum / count as f64),
        ]);
    }

    debug!(
        "Resampled {} samples into {} weekly rows for '{}'",
        samples.len(),
        table.rows.len(),
        source
    );

    table
}
