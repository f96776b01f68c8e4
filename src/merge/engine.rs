//! Core merge engine implementation.
//! Joins normalized panels into one unified panel keyed by `(platform, year, week)`.

use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

use super::config::{KeyColumns, MergeConfig};
use super::normalizer::{normalize_panel, plan_column_names, resolve_key_columns};
use super::schema::{
    Cell, ColumnKind, ColumnSpec, MergeReport, PanelKey, PanelRow, PanelSource, PanelTable,
    SkippedSource, UnifiedPanel,
};
use super::MergeError;
use crate::utils::config::{PLATFORM_COLUMN, WEEK_COLUMN, YEAR_COLUMN};

/// Result of a merge run
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub panel: UnifiedPanel,
    pub report: MergeReport,
}

/// Merge weekly panels with a full outer join on `(platform, year, week)`
///
/// # Arguments
/// * `sources` - Input panels in priority order (the first keeps bare column names)
/// * `config` - Platform aliases, key column aliases and duplicate policy
///
/// # Returns
/// The unified panel, sorted by key, plus a report of everything the merge changed
///
/// # Errors
/// * `MergeError::DuplicateSource` - Two inputs share a source name
/// * `MergeError::SchemaMismatch` - An input lacks a key column
/// * `MergeError::KeyCollision` - An input repeats a key under `DuplicatePolicy::Reject`
/// * `MergeError::InvalidKey` / `MergeError::RaggedRow` - Malformed input rows
///
/// # Example
/// ```ignore
/// let outcome = merge_panels(vec![decentralization.into(), market.into()], &MergeConfig::default())?;
/// assert!(outcome.panel.get(&key, "market_cap").is_some());
/// ```
pub fn merge_panels(
    sources: impl IntoIterator<Item = PanelSource>,
    config: &MergeConfig,
) -> Result<MergeOutcome, MergeError> {
    config.validate()?;

    let sources: Vec<PanelSource> = sources.into_iter().collect();
    check_source_names(&sources)?;

    let mut report = MergeReport::default();

    // Step 1: Normalize every available panel (aliases, keys, duplicates)
    let mut normalized = Vec::new();
    for source in &sources {
        match source {
            PanelSource::Loaded(table) => {
                let panel = normalize_panel(table, config)?;
                report.rows_missing_key += panel.rows_missing_key;
                report.duplicates_removed += panel.duplicates_removed;
                report.duplicate_keys.extend(panel.duplicate_keys.iter().cloned());
                report.sources_merged.push(panel.source.clone());
                normalized.push(panel);
            }
            PanelSource::Unavailable { source, reason } => {
                info!("Skipping unavailable panel '{}': {}", source, reason);
                report.sources_skipped.push(SkippedSource {
                    source: source.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    // Step 2: Resolve column collisions before anything is written
    let (names, renames) = plan_column_names(&normalized);
    report.renamed_columns = renames;

    let mut columns = Vec::new();
    let mut offsets = Vec::with_capacity(normalized.len());
    for (panel, panel_names) in normalized.iter().zip(&names) {
        offsets.push(columns.len());
        for ((_, kind), name) in panel.columns.iter().zip(panel_names) {
            let kind = if config.count_columns.contains(name) {
                ColumnKind::Count
            } else {
                *kind
            };
            columns.push(ColumnSpec {
                name: name.clone(),
                source: panel.source.clone(),
                kind,
            });
        }
    }
    let width = columns.len();

    // Step 3: Full outer join; untouched cells stay Missing
    let mut joined: BTreeMap<PanelKey, Vec<Cell>> = BTreeMap::new();
    for (panel, offset) in normalized.into_iter().zip(offsets) {
        debug!("Joining '{}' ({} rows) at column offset {}", panel.source, panel.rows.len(), offset);
        for (key, values) in panel.rows {
            let row = joined.entry(key).or_insert_with(|| vec![Cell::Missing; width]);
            for (i, value) in values.into_iter().enumerate() {
                row[offset + i] = value;
            }
        }
    }

    let mut rows: Vec<PanelRow> = joined
        .into_iter()
        .map(|(key, values)| PanelRow { key, values })
        .collect();

    // Step 4: Joined keys come out of a map, so they are unique and ascending
    debug_assert!(
        rows.windows(2).all(|pair| pair[0].key < pair[1].key),
        "joined panel keys must be strictly ascending"
    );

    // Step 5: Zero-fill count columns only; measures keep their Missing marker
    report.zero_filled_cells = fill_count_columns(&mut rows, &columns);

    report.rows_out = rows.len();

    info!(
        "Merged {} panels into {} rows x {} columns ({} skipped, {} renamed, {} duplicates removed)",
        report.sources_merged.len(),
        report.rows_out,
        width,
        report.sources_skipped.len(),
        report.renamed_columns.len(),
        report.duplicates_removed
    );

    Ok(MergeOutcome {
        panel: UnifiedPanel { columns, rows },
        report,
    })
}

fn check_source_names(sources: &[PanelSource]) -> Result<(), MergeError> {
    let mut seen = HashSet::new();
    for source in sources {
        if !seen.insert(source.source_name()) {
            return Err(MergeError::DuplicateSource(source.source_name().to_string()));
        }
    }
    Ok(())
}

fn fill_count_columns(rows: &mut [PanelRow], columns: &[ColumnSpec]) -> usize {
    let count_indices: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.kind == ColumnKind::Count)
        .map(|(idx, _)| idx)
        .collect();

    let mut filled = 0;
    for row in rows.iter_mut() {
        for &idx in &count_indices {
            if row.values[idx].is_missing() {
                row.values[idx] = Cell::Number(0.0);
                filled += 1;
            }
        }
    }
    filled
}

/// Stack panels that share a schema but cover different platforms or periods
///
/// Key columns are renamed to `platform`/`year`/`week`; every other column
/// is the union across inputs in first-seen order, with `Missing` where an
/// input lacks it. Repeated keys are kept as-is so the subsequent merge can
/// reject or resolve them under its duplicate policy.
///
/// # Errors
/// * `MergeError::SchemaMismatch` - An input lacks a key column
/// * `MergeError::RaggedRow` - Row arity differs from the column list
pub fn stack_panels(
    source: impl Into<String>,
    tables: &[PanelTable],
    keys: &KeyColumns,
) -> Result<PanelTable, MergeError> {
    let mut columns: Vec<String> = vec![
        PLATFORM_COLUMN.to_string(),
        YEAR_COLUMN.to_string(),
        WEEK_COLUMN.to_string(),
    ];
    let mut count_columns: Vec<String> = Vec::new();

    let mut resolved = Vec::with_capacity(tables.len());
    for table in tables {
        let indices = resolve_key_columns(table, keys)?;
        for (idx, name) in table.columns.iter().enumerate() {
            if !indices.contains(idx) && !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        for name in &table.count_columns {
            if !count_columns.contains(name) {
                count_columns.push(name.clone());
            }
        }
        resolved.push(indices);
    }

    let mut stacked = PanelTable::new(source, columns);
    stacked.count_columns = count_columns;

    for (table, indices) in tables.iter().zip(resolved) {
        let positions: Vec<Option<usize>> = stacked
            .columns
            .iter()
            .enumerate()
            .map(|(target, name)| match target {
                0 => Some(indices.platform),
                1 => Some(indices.year),
                2 => Some(indices.week),
                _ => table
                    .columns
                    .iter()
                    .enumerate()
                    .find(|(idx, own)| *own == name && !indices.contains(*idx))
                    .map(|(idx, _)| idx),
            })
            .collect();

        for (row_idx, row) in table.rows.iter().enumerate() {
            if row.len() != table.columns.len() {
                return Err(MergeError::RaggedRow {
                    panel: table.source.clone(),
                    row: row_idx,
                    expected: table.columns.len(),
                    found: row.len(),
                });
            }
            stacked.push_row(
                positions
                    .iter()
                    .map(|pos| pos.map(|idx| row[idx].clone()).unwrap_or_default())
                    .collect(),
            );
        }
    }

    debug!(
        "Stacked {} panels into '{}' ({} rows, {} columns)",
        tables.len(),
        stacked.source,
        stacked.rows.len(),
        stacked.columns.len()
    );

    Ok(stacked)
}
