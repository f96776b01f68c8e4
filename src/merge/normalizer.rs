//! Panel normalization ahead of the join.
//!
//! Resolves key columns through their aliases, canonicalizes platform names,
//! validates ISO year/week values, enforces per-panel key uniqueness and
//! plans collision-free names for measurement columns.

use chrono::{NaiveDate, Weekday};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};

use super::config::{DuplicatePolicy, KeyColumns, MergeConfig, PlatformAliases};
use super::schema::{Cell, ColumnKind, ColumnRename, DuplicateKey, PanelKey, PanelTable};
use super::MergeError;
use crate::utils::config::{PLATFORM_COLUMN, WEEK_COLUMN, YEAR_COLUMN};

/// Positions of the three key columns within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyIndices {
    pub platform: usize,
    pub year: usize,
    pub week: usize,
}

impl KeyIndices {
    pub fn contains(&self, idx: usize) -> bool {
        idx == self.platform || idx == self.year || idx == self.week
    }
}

/// A panel with canonical keys, ready to join
#[derive(Debug, Clone)]
pub struct NormalizedPanel {
    pub source: String,

    /// Measurement columns as named by the producer, with their kind
    pub columns: Vec<(String, ColumnKind)>,

    /// Unique keys in first-occurrence order, with measurement cells
    pub rows: Vec<(PanelKey, Vec<Cell>)>,

    pub rows_missing_key: usize,
    pub duplicates_removed: usize,
    pub duplicate_keys: Vec<DuplicateKey>,
}

/// Find the key columns of a table
///
/// # Errors
/// * `MergeError::SchemaMismatch` - listing every key with no matching column
pub fn resolve_key_columns(table: &PanelTable, keys: &KeyColumns) -> Result<KeyIndices, MergeError> {
    let find = |aliases: &[String]| aliases.iter().find_map(|alias| table.column_index(alias));

    let platform = find(&keys.platform);
    let year = find(&keys.year);
    let week = find(&keys.week);

    match (platform, year, week) {
        (Some(platform), Some(year), Some(week)) => Ok(KeyIndices { platform, year, week }),
        _ => {
            let missing = [
                (PLATFORM_COLUMN, platform),
                (YEAR_COLUMN, year),
                (WEEK_COLUMN, week),
            ]
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

            Err(MergeError::SchemaMismatch {
                panel: table.source.clone(),
                missing,
            })
        }
    }
}

/// Extract the canonical key of one row
///
/// Returns `Ok(None)` when a key cell is empty (the row has no key and is
/// dropped by the caller) and `Err` with a reason when a value is present
/// but unusable.
pub fn extract_key(
    row: &[Cell],
    indices: KeyIndices,
    aliases: &PlatformAliases,
) -> Result<Option<PanelKey>, String> {
    let platform = match &row[indices.platform] {
        Cell::Missing => return Ok(None),
        Cell::Text(raw) => {
            let canonical = aliases.canonicalize(raw);
            if canonical.is_empty() {
                return Ok(None);
            }
            canonical
        }
        Cell::Number(n) => return Err(format!("platform must be text, found number {}", n)),
    };

    let year = match integer_cell(&row[indices.year], "year")? {
        Some(year) => year,
        None => return Ok(None),
    };
    let week = match integer_cell(&row[indices.week], "week")? {
        Some(week) => week,
        None => return Ok(None),
    };

    let year = i32::try_from(year).map_err(|_| format!("year {} out of range", year))?;
    if !(1..=53).contains(&week) {
        return Err(format!("week {} outside 1..=53", week));
    }
    let week = week as u32;

    if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
        return Err(format!("ISO year {} has no week {}", year, week));
    }

    Ok(Some(PanelKey::new(platform, year, week)))
}

/// Read an integer out of a numeric or textual cell
fn integer_cell(cell: &Cell, label: &str) -> Result<Option<i64>, String> {
    match cell {
        Cell::Missing => Ok(None),
        Cell::Number(n) if n.is_finite() && n.fract() == 0.0 => Ok(Some(*n as i64)),
        Cell::Number(n) => Err(format!("{} must be an integer, found {}", label, n)),
        Cell::Text(s) if s.trim().is_empty() => Ok(None),
        Cell::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format!("{} must be an integer, found '{}'", label, s)),
    }
}

/// Normalize one input table
///
/// # Errors
/// * `MergeError::SchemaMismatch` - Key columns missing
/// * `MergeError::RaggedRow` - Row arity differs from the column list
/// * `MergeError::InvalidKey` - Key value present but unusable
/// * `MergeError::KeyCollision` - Duplicate keys under `DuplicatePolicy::Reject`
pub fn normalize_panel(table: &PanelTable, config: &MergeConfig) -> Result<NormalizedPanel, MergeError> {
    let indices = resolve_key_columns(table, &config.key_columns)?;
    let width = table.columns.len();

    let measure_indices: Vec<usize> = (0..width).filter(|idx| !indices.contains(*idx)).collect();

    let columns = measure_indices
        .iter()
        .map(|&idx| {
            let name = table.columns[idx].clone();
            let kind = if table.count_columns.contains(&name) {
                ColumnKind::Count
            } else {
                ColumnKind::Measure
            };
            (name, kind)
        })
        .collect();

    let mut keyed: Vec<(PanelKey, Vec<Cell>)> = Vec::with_capacity(table.rows.len());
    let mut rows_missing_key = 0;

    for (row_idx, row) in table.rows.iter().enumerate() {
        if row.len() != width {
            return Err(MergeError::RaggedRow {
                panel: table.source.clone(),
                row: row_idx,
                expected: width,
                found: row.len(),
            });
        }

        let key = extract_key(row, indices, &config.platform_aliases).map_err(|reason| {
            MergeError::InvalidKey {
                panel: table.source.clone(),
                row: row_idx,
                reason,
            }
        })?;

        match key {
            Some(key) => {
                let values = measure_indices.iter().map(|&idx| row[idx].clone()).collect();
                keyed.push((key, values));
            }
            None => rows_missing_key += 1,
        }
    }

    if rows_missing_key > 0 {
        warn!(
            "Panel '{}': dropped {} rows with an empty platform/year/week",
            table.source, rows_missing_key
        );
    }

    let duplicate_keys = find_duplicates(&table.source, keyed.iter().map(|(key, _)| key));

    let (rows, duplicates_removed) = if duplicate_keys.is_empty() {
        (keyed, 0)
    } else {
        match config.duplicate_policy {
            DuplicatePolicy::Reject => {
                return Err(MergeError::KeyCollision {
                    panel: table.source.clone(),
                    duplicates: duplicate_keys,
                });
            }
            DuplicatePolicy::KeepFirst => {
                let before = keyed.len();
                let kept = keep_first(keyed);
                let removed = before - kept.len();
                warn!(
                    "Panel '{}': {} duplicated keys, removed {} rows (keep-first)",
                    table.source,
                    duplicate_keys.len(),
                    removed
                );
                (kept, removed)
            }
        }
    };

    debug!(
        "Normalized panel '{}': {} rows, {} measurement columns",
        table.source,
        rows.len(),
        measure_indices.len()
    );

    Ok(NormalizedPanel {
        source: table.source.clone(),
        columns,
        rows,
        rows_missing_key,
        duplicates_removed,
        duplicate_keys: if duplicates_removed > 0 { duplicate_keys } else { Vec::new() },
    })
}

/// Keys occurring more than once, sorted by key
pub fn find_duplicates<'a>(source: &str, keys: impl Iterator<Item = &'a PanelKey>) -> Vec<DuplicateKey> {
    let mut counts: BTreeMap<&PanelKey, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, occurrences)| *occurrences > 1)
        .map(|(key, occurrences)| DuplicateKey {
            source: source.to_string(),
            key: key.clone(),
            occurrences,
        })
        .collect()
}

/// Drop every repeat of a key after its first occurrence, preserving order
pub fn keep_first<T>(rows: Vec<(PanelKey, T)>) -> Vec<(PanelKey, T)> {
    let mut seen: HashSet<PanelKey> = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|(key, _)| seen.insert(key.clone()))
        .collect()
}

/// Assign unified-panel names to every measurement column
///
/// Key column names are reserved. The first panel to use a name keeps it;
/// later panels get `<name>_<source>` (with a numeric tail if even that is
/// taken). Returns the names per panel and the renames performed.
pub fn plan_column_names(panels: &[NormalizedPanel]) -> (Vec<Vec<String>>, Vec<ColumnRename>) {
    let mut taken: HashSet<String> = [PLATFORM_COLUMN, YEAR_COLUMN, WEEK_COLUMN]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut renames = Vec::new();

    let names = panels
        .iter()
        .map(|panel| {
            panel
                .columns
                .iter()
                .map(|(name, _)| {
                    let assigned = unique_name(name, &panel.source, &taken);
                    if &assigned != name {
                        debug!("Column '{}' from '{}' renamed to '{}'", name, panel.source, assigned);
                        renames.push(ColumnRename {
                            source: panel.source.clone(),
                            from: name.clone(),
                            to: assigned.clone(),
                        });
                    }
                    taken.insert(assigned.clone());
                    assigned
                })
                .collect()
        })
        .collect();

    (names, renames)
}

fn unique_name(base: &str, source: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    let suffixed = format!("{}_{}", base, source);
    if !taken.contains(&suffixed) {
        return suffixed;
    }

    (2..)
        .map(|n| format!("{}_{}_{}", base, source, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(suffixed)
}
