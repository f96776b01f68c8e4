//! Configuration and constants for the metrics engine and the CLI.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Proportions at or below this value count as "no events in the window"
pub const ZERO_PROPORTION_EPSILON: f64 = 1e-12;

/// Proportion sums above this almost certainly come from a grouping bug upstream
pub const PROPORTION_SUM_WARN_THRESHOLD: f64 = 1.5;

/// Canonical key column names in every panel we emit
pub const PLATFORM_COLUMN: &str = "platform";
pub const YEAR_COLUMN: &str = "year";
pub const WEEK_COLUMN: &str = "week";

// Field names for raw event parsing (different collectors use different names)
pub const PLATFORM_FIELD_NAMES: &[&str] = &["platform", "Platform", "chain"];
pub const TIMESTAMP_FIELD_NAMES: &[&str] = &[
    "timestamp",
    "block_date",
    "commit_date",
    "date",
    "time",
];
pub const PARTICIPANT_FIELD_NAMES: &[&str] = &[
    "participant",
    "miner",
    "author_email",
    "author",
    "producer",
];

// Key column aliases accepted on input panels when no config overrides them
pub const DEFAULT_PLATFORM_ALIASES: &[&str] = &["platform", "Platform", "chain"];
pub const DEFAULT_YEAR_ALIASES: &[&str] = &["year", "Year", "iso_year"];
pub const DEFAULT_WEEK_ALIASES: &[&str] = &["week", "Week", "iso_week"];

/// Accepted timestamp layouts, tried in order after RFC 3339
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
