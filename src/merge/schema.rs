//! Schema definitions for input panels, the unified panel and merge reports.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::parser::schema::GroupKey;
use crate::utils::config::{PLATFORM_COLUMN, WEEK_COLUMN, YEAR_COLUMN};

/// A single cell of a panel
///
/// `Missing` is the explicit "no observation for this key" marker and is
/// never the same thing as `Number(0.0)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert to a JSON value (`Missing` becomes `null`)
    pub fn to_json(&self) -> Value {
        match self {
            Self::Missing => Value::Null,
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// How a column behaves when a key has no observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Non-additive measurement (entropy, HHI, prices); gaps stay `Missing`
    #[default]
    Measure,
    /// Additive count (events, proposals); gaps are filled with zero
    Count,
}

/// A non-key column of the unified panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Name in the unified panel (after collision renaming)
    pub name: String,

    /// Source panel the column came from
    pub source: String,

    pub kind: ColumnKind,
}

/// A weekly panel as produced by some collector, before normalization
///
/// `columns` includes the key columns under whatever names the producer
/// used; the merge engine resolves them through the configured aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelTable {
    /// Short source name, used as the collision suffix
    pub source: String,

    /// Column names in order
    pub columns: Vec<String>,

    /// Row-major cells, one entry per column
    pub rows: Vec<Vec<Cell>>,

    /// Columns that may be zero-filled where the key has no observation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub count_columns: Vec<String>,
}

impl PanelTable {
    pub fn new(source: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            source: source.into(),
            columns,
            rows: Vec::new(),
            count_columns: Vec::new(),
        }
    }

    /// Mark columns as count-like
    pub fn with_count_columns(mut self, columns: &[&str]) -> Self {
        self.count_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One input to a merge run
///
/// A source that could not be produced is still listed, so its absence
/// shows up in the report instead of silently shrinking the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelSource {
    Loaded(PanelTable),
    Unavailable { source: String, reason: String },
}

impl PanelSource {
    pub fn source_name(&self) -> &str {
        match self {
            Self::Loaded(table) => &table.source,
            Self::Unavailable { source, .. } => source,
        }
    }
}

impl From<PanelTable> for PanelSource {
    fn from(table: PanelTable) -> Self {
        Self::Loaded(table)
    }
}

/// The `(platform, year, week)` key of the unified panel
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PanelKey {
    pub platform: String,
    pub year: i32,
    pub week: u32,
}

impl PanelKey {
    pub fn new(platform: impl Into<String>, year: i32, week: u32) -> Self {
        Self {
            platform: platform.into(),
            year,
            week,
        }
    }

    /// Integer time index `year * 100 + week` (e.g. 202410)
    pub fn time_index(&self) -> i64 {
        self.year as i64 * 100 + self.week as i64
    }

    /// Monday that opens this ISO week, if the week exists in that ISO year
    pub fn week_start(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
    }
}

impl From<GroupKey> for PanelKey {
    fn from(key: GroupKey) -> Self {
        Self {
            platform: key.platform,
            year: key.iso_year,
            week: key.iso_week,
        }
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-W{:02}", self.platform, self.year, self.week)
    }
}

/// A row of the unified panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    pub key: PanelKey,

    /// One cell per entry of `UnifiedPanel::columns`
    pub values: Vec<Cell>,
}

/// The merged panel: one row per key, sorted by key
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnifiedPanel {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<PanelRow>,
}

impl UnifiedPanel {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn row(&self, key: &PanelKey) -> Option<&PanelRow> {
        self.rows
            .binary_search_by(|row| row.key.cmp(key))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// Cell at `(key, column)`, `None` if either is unknown
    pub fn get(&self, key: &PanelKey, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.row(key).and_then(|row| row.values.get(idx))
    }

    pub fn keys(&self) -> impl Iterator<Item = &PanelKey> {
        self.rows.iter().map(|row| &row.key)
    }

    /// Render rows as flat JSON objects: key columns first, then every column
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                record.insert(PLATFORM_COLUMN.to_string(), Value::from(row.key.platform.clone()));
                record.insert(YEAR_COLUMN.to_string(), Value::from(row.key.year));
                record.insert(WEEK_COLUMN.to_string(), Value::from(row.key.week));
                for (spec, cell) in self.columns.iter().zip(&row.values) {
                    record.insert(spec.name.clone(), cell.to_json());
                }
                record
            })
            .collect()
    }

    /// Convert back into a `PanelTable` that keeps the count-column declarations
    ///
    /// Flat records lose `ColumnKind`; this form lets a merged panel be fed
    /// to another merge with its count columns still zero-filled.
    pub fn to_table(&self, source: impl Into<String>) -> PanelTable {
        let mut columns = vec![
            PLATFORM_COLUMN.to_string(),
            YEAR_COLUMN.to_string(),
            WEEK_COLUMN.to_string(),
        ];
        columns.extend(self.columns.iter().map(|spec| spec.name.clone()));

        let mut table = PanelTable::new(source, columns);
        table.count_columns = self
            .columns
            .iter()
            .filter(|spec| spec.kind == ColumnKind::Count)
            .map(|spec| spec.name.clone())
            .collect();

        for row in &self.rows {
            let mut cells = vec![
                Cell::from(row.key.platform.as_str()),
                Cell::Number(row.key.year as f64),
                Cell::Number(row.key.week as f64),
            ];
            cells.extend(row.values.iter().cloned());
            table.push_row(cells);
        }

        table
    }
}

/// A non-key column renamed to avoid overwriting another source's column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub source: String,
    pub from: String,
    pub to: String,
}

/// A key seen more than once within one input panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub source: String,
    pub key: PanelKey,
    pub occurrences: usize,
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{} in {}", self.key, self.occurrences, self.source)
    }
}

/// A source skipped because it was not available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub source: String,
    pub reason: String,
}

/// What a merge run did, for callers and logs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergeReport {
    /// Sources joined, in input order
    pub sources_merged: Vec<String>,

    /// Sources listed but not available
    pub sources_skipped: Vec<SkippedSource>,

    /// Collision renames applied
    pub renamed_columns: Vec<ColumnRename>,

    /// Rows removed by the keep-first duplicate policy
    pub duplicates_removed: usize,

    /// Keys that were duplicated (only populated under keep-first)
    pub duplicate_keys: Vec<DuplicateKey>,

    /// Input rows dropped because a key value was null
    pub rows_missing_key: usize,

    /// Count cells zero-filled after the join
    pub zero_filled_cells: usize,

    /// Rows in the unified panel
    pub rows_out: usize,
}

/// A run of ISO weeks with no row for a platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub platform: String,

    /// First missing week
    pub from: PanelKey,

    /// Last missing week (inclusive)
    pub to: PanelKey,

    pub missing_weeks: usize,
}
