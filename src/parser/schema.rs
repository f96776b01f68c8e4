//! Record definitions for raw events and weekly metric output.
//!
//! Everything here is a plain value type. Records relate to each other only
//! through the shared `(platform, year, week)` key.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One mining or commit event as supplied by a collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Platform identifier (canonicalized by the aggregator)
    pub platform: String,

    /// When the block was mined or the commit authored
    pub timestamp: NaiveDateTime,

    /// Miner identity or author email
    pub participant: String,
}

impl RawEvent {
    pub fn new(platform: impl Into<String>, timestamp: NaiveDateTime, participant: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            timestamp,
            participant: participant.into(),
        }
    }
}

/// Composite grouping key `(platform, iso_year, iso_week)`
///
/// Ordering is platform first, then ISO year, then ISO week, which is the
/// sort order of every table we emit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub platform: String,
    pub iso_year: i32,
    pub iso_week: u32,
}

impl GroupKey {
    /// Build the key from a platform and a timestamp using ISO-8601 week numbering.
    ///
    /// Dec 31 can land in week 1 of the next ISO year and Jan 1 in week 52/53
    /// of the previous one; calendar year is never used.
    pub fn from_timestamp(platform: impl Into<String>, timestamp: &NaiveDateTime) -> Self {
        let iso = timestamp.date().iso_week();
        Self {
            platform: platform.into(),
            iso_year: iso.year(),
            iso_week: iso.week(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-W{:02}", self.platform, self.iso_year, self.iso_week)
    }
}

/// Share of one participant within one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantShare {
    pub group_key: GroupKey,
    pub participant: String,
    pub event_count: u64,
    pub total_count: u64,
    pub proportion: f64,
}

/// One normalized metrics row per `(platform, year, week)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMetricRow {
    pub platform: String,

    /// ISO year
    pub year: i32,

    /// ISO week (1..=53)
    pub week: u32,

    /// Effective number of equally sized participants
    pub inverse_hhi: f64,

    /// Natural-log Shannon entropy of participant shares
    pub shannon_entropy: f64,

    pub total_events: u64,

    pub unique_participants: u64,
}

impl WeeklyMetricRow {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            platform: self.platform.clone(),
            iso_year: self.year,
            iso_week: self.week,
        }
    }
}

/// Which kind of raw event a metric series was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFamily {
    /// Block producers (miners, validators)
    Blocks,
    /// Commit authors on the client repository
    Commits,
}

impl EventFamily {
    /// Column prefix used when the family is turned into a panel
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Blocks => "block",
            Self::Commits => "commit",
        }
    }

    /// Source name used when the family is merged with other panels
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Commits => "commits",
        }
    }
}

impl std::str::FromStr for EventFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blocks" | "block" | "miners" => Ok(Self::Blocks),
            "commits" | "commit" | "authors" => Ok(Self::Commits),
            other => Err(format!("unknown event family '{}'", other)),
        }
    }
}
