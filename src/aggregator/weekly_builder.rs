//! Build weekly concentration rows from raw events.
//!
//! Each event is keyed by `(platform, ISO year, ISO week)`, events are
//! counted per participant within the key, and the resulting proportions go
//! through the concentration calculator.
//!
//! Example: two miners with 3 and 1 blocks in one week give proportions
//! `[0.75, 0.25]`, inverse HHI 1.6 and entropy ~0.5623.

use crate::merge::PlatformAliases;
use crate::parser::schema::{GroupKey, ParticipantShare, RawEvent, WeeklyMetricRow};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::metrics::calculate_concentration;

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Aggregator settings, passed in rather than read from globals
#[derive(Debug, Clone, Default)]
pub struct AggregatorConfig {
    /// Canonical platform names, applied before grouping
    pub platform_aliases: PlatformAliases,

    /// Only events inside this window are counted
    pub date_range: Option<DateRange>,
}

/// Groups raw events into weekly concentration rows
///
/// **Public** - main entry point for weekly aggregation
#[derive(Debug, Clone, Default)]
pub struct WeeklyAggregator {
    config: AggregatorConfig,
}

/// Per-group participant counts, ordered so output never depends on hashing
type GroupCounts = BTreeMap<GroupKey, BTreeMap<String, u64>>;

impl WeeklyAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Count events per participant per group
    fn count_events(&self, events: &[RawEvent]) -> GroupCounts {
        let mut groups = GroupCounts::new();
        let mut out_of_range = 0usize;
        let mut unattributed = 0usize;

        for event in events {
            if let Some(range) = &self.config.date_range {
                if !range.contains(event.timestamp.date()) {
                    out_of_range += 1;
                    continue;
                }
            }

            let platform = self.config.platform_aliases.canonicalize(&event.platform);
            let participant = event.participant.trim();
            if platform.is_empty() || participant.is_empty() {
                unattributed += 1;
                continue;
            }

            let key = GroupKey::from_timestamp(platform, &event.timestamp);
            *groups
                .entry(key)
                .or_default()
                .entry(participant.to_string())
                .or_insert(0) += 1;
        }

        if out_of_range > 0 {
            debug!("Excluded {} events outside the date range", out_of_range);
        }
        if unattributed > 0 {
            warn!(
                "Skipped {} events with an empty platform or participant",
                unattributed
            );
        }

        groups
    }

    /// Per-participant shares for every group, sorted by key then participant
    pub fn participant_shares(&self, events: &[RawEvent]) -> Vec<ParticipantShare> {
        let groups = self.count_events(events);

        let mut shares = Vec::new();
        for (key, participants) in groups {
            let total_count: u64 = participants.values().sum();
            for (participant, event_count) in participants {
                shares.push(ParticipantShare {
                    group_key: key.clone(),
                    participant,
                    event_count,
                    total_count,
                    proportion: proportion(event_count, total_count),
                });
            }
        }

        shares
    }

    /// One metrics row per `(platform, ISO year, ISO week)`, sorted by key
    pub fn aggregate(&self, events: &[RawEvent]) -> Vec<WeeklyMetricRow> {
        debug!("Aggregating {} events into weekly groups", events.len());

        let groups = self.count_events(events);

        let rows: Vec<WeeklyMetricRow> = groups
            .into_iter()
            .map(|(key, participants)| build_row(key, &participants))
            .collect();

        debug!("Built {} weekly metric rows", rows.len());

        rows
    }
}

fn proportion(event_count: u64, total_count: u64) -> f64 {
    if total_count > 0 {
        event_count as f64 / total_count as f64
    } else {
        0.0
    }
}

/// Turn one group's participant counts into a metrics row
///
/// A group whose counts are all zero yields zeros rather than dividing by zero.
pub fn build_row(key: GroupKey, participants: &BTreeMap<String, u64>) -> WeeklyMetricRow {
    let total_events: u64 = participants.values().sum();
    let proportions: Vec<f64> = participants
        .values()
        .map(|&count| proportion(count, total_events))
        .collect();

    let metrics = calculate_concentration(&proportions);
    if !metrics.warnings.is_empty() {
        debug!("{}: {:?}", key, metrics.warnings);
    }

    WeeklyMetricRow {
        platform: key.platform,
        year: key.iso_year,
        week: key.iso_week,
        inverse_hhi: metrics.inverse_hhi,
        shannon_entropy: metrics.shannon_entropy,
        total_events,
        unique_participants: participants.values().filter(|&&count| count > 0).count() as u64,
    }
}

/// Aggregate with default settings (no aliases, no date window)
pub fn aggregate_weekly(events: &[RawEvent]) -> Vec<WeeklyMetricRow> {
    WeeklyAggregator::default().aggregate(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_build_row_zero_events() {
        let key = GroupKey {
            platform: "Alpha".to_string(),
            iso_year: 2024,
            iso_week: 10,
        };
        let mut participants = BTreeMap::new();
        participants.insert("m1".to_string(), 0);

        let row = build_row(key, &participants);
        assert_eq!(row.total_events, 0);
        assert_eq!(row.unique_participants, 0);
        assert_eq!(row.inverse_hhi, 0.0);
        assert_eq!(row.shannon_entropy, 0.0);
    }

    #[test]
    fn test_date_range_excludes_events() {
        let aggregator = WeeklyAggregator::new(AggregatorConfig {
            date_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )),
            ..Default::default()
        });

        let events = vec![
            RawEvent::new("Alpha", ts("2023-12-31"), "m1"),
            RawEvent::new("Alpha", ts("2024-01-02"), "m1"),
        ];

        let rows = aggregator.aggregate(&events);
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].year, rows[0].week), (2024, 1));
    }

    #[test]
    fn test_aliases_merge_platform_spellings() {
        let aggregator = WeeklyAggregator::new(AggregatorConfig {
            platform_aliases: PlatformAliases::new().with_alias("Ethereum_Go", "Ethereum"),
            ..Default::default()
        });

        let events = vec![
            RawEvent::new("Ethereum_Go", ts("2024-03-05"), "a@example.org"),
            RawEvent::new("Ethereum", ts("2024-03-06"), "b@example.org"),
        ];

        let rows = aggregator.aggregate(&events);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].platform, "Ethereum");
        assert_eq!(rows[0].unique_participants, 2);
    }

    #[test]
    fn test_blank_participant_is_skipped() {
        let events = vec![
            RawEvent::new("Alpha", ts("2024-03-05"), "  "),
            RawEvent::new("Alpha", ts("2024-03-05"), "m1"),
        ];
        let rows = aggregate_weekly(&events);
        assert_eq!(rows[0].total_events, 1);
    }
}
