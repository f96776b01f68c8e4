//! Post-merge analysis: coverage gaps and derived per-platform series.

use chrono::{Datelike, Duration};

use super::schema::{Cell, ColumnKind, ColumnSpec, CoverageGap, PanelKey, UnifiedPanel};
use super::MergeError;

/// List runs of ISO weeks with no row, per platform, between the platform's
/// first and last observed week
pub fn coverage_gaps(panel: &UnifiedPanel) -> Vec<CoverageGap> {
    let mut gaps = Vec::new();

    for pair in panel.rows.windows(2) {
        let (prev, next) = (&pair[0].key, &pair[1].key);
        if prev.platform != next.platform {
            continue;
        }

        let (Some(prev_start), Some(next_start)) = (prev.week_start(), next.week_start()) else {
            continue;
        };

        let weeks_between = (next_start - prev_start).num_days() / 7;
        if weeks_between <= 1 {
            continue;
        }

        let from = key_for(&prev.platform, prev_start + Duration::weeks(1));
        let to = key_for(&prev.platform, next_start - Duration::weeks(1));

        gaps.push(CoverageGap {
            platform: prev.platform.clone(),
            from,
            to,
            missing_weeks: (weeks_between - 1) as usize,
        });
    }

    gaps
}

fn key_for(platform: &str, date: chrono::NaiveDate) -> PanelKey {
    let iso = date.iso_week();
    PanelKey::new(platform, iso.year(), iso.week())
}

impl UnifiedPanel {
    /// Append `<column>_pct_change`: the per-platform percentage change from
    /// the previous row in key order
    ///
    /// A missing value on either side, or a zero predecessor, yields `Missing`.
    ///
    /// # Errors
    /// * `MergeError::SchemaMismatch` - `column` is not in the panel
    pub fn with_percent_change(mut self, column: &str) -> Result<Self, MergeError> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| MergeError::SchemaMismatch {
                panel: "<merged>".to_string(),
                missing: vec![column.to_string()],
            })?;

        let source = self.columns[idx].source.clone();
        self.columns.push(ColumnSpec {
            name: format!("{}_pct_change", column),
            source,
            kind: ColumnKind::Measure,
        });

        let mut previous: Option<(String, Option<f64>)> = None;
        for row in self.rows.iter_mut() {
            let current = row.values[idx].as_f64();

            let change = match &previous {
                Some((platform, Some(prev))) if *platform == row.key.platform && *prev != 0.0 => current
                    .map(|cur| Cell::Number((cur - prev) / prev * 100.0))
                    .unwrap_or(Cell::Missing),
                _ => Cell::Missing,
            };

            row.values.push(change);
            previous = Some((row.key.platform.clone(), current));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::schema::PanelRow;

    fn panel(rows: &[(&str, i32, u32, Cell)]) -> UnifiedPanel {
        UnifiedPanel {
            columns: vec![ColumnSpec {
                name: "price".to_string(),
                source: "market".to_string(),
                kind: ColumnKind::Measure,
            }],
            rows: rows
                .iter()
                .map(|(p, y, w, c)| PanelRow {
                    key: PanelKey::new(*p, *y, *w),
                    values: vec![c.clone()],
                })
                .collect(),
        }
    }

    #[test]
    fn test_gap_across_iso_year_boundary() {
        // 2020 has 53 ISO weeks: W52 -> W53 -> 2021-W01 -> 2021-W02
        let p = panel(&[
            ("Alpha", 2020, 52, Cell::Missing),
            ("Alpha", 2021, 2, Cell::Missing),
        ]);
        let gaps = coverage_gaps(&p);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].missing_weeks, 2);
        assert_eq!(gaps[0].from, PanelKey::new("Alpha", 2020, 53));
        assert_eq!(gaps[0].to, PanelKey::new("Alpha", 2021, 1));
    }

    #[test]
    fn test_no_gap_between_platforms() {
        let p = panel(&[
            ("Alpha", 2024, 1, Cell::Missing),
            ("Beta", 2024, 30, Cell::Missing),
        ]);
        assert!(coverage_gaps(&p).is_empty());
    }

    #[test]
    fn test_percent_change_resets_per_platform() {
        let p = panel(&[
            ("Alpha", 2024, 1, Cell::Number(100.0)),
            ("Alpha", 2024, 2, Cell::Number(150.0)),
            ("Beta", 2024, 1, Cell::Number(10.0)),
            ("Beta", 2024, 2, Cell::Missing),
            ("Beta", 2024, 3, Cell::Number(12.0)),
        ])
        .with_percent_change("price")
        .unwrap();

        let idx = p.column_index("price_pct_change").unwrap();
        let changes: Vec<&Cell> = p.rows.iter().map(|r| &r.values[idx]).collect();
        assert_eq!(changes[0], &Cell::Missing);
        assert_eq!(changes[1], &Cell::Number(50.0));
        assert_eq!(changes[2], &Cell::Missing);
        assert_eq!(changes[3], &Cell::Missing);
        assert_eq!(changes[4], &Cell::Missing);
    }

    #[test]
    fn test_percent_change_unknown_column() {
        let p = panel(&[("Alpha", 2024, 1, Cell::Number(1.0))]);
        assert!(p.with_percent_change("volume").is_err());
    }
}
