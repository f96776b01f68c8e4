//! Integration tests for the merge module.
//!
//! Tests the complete normalize, join and report workflow on synthetic panels.

use super::*;
use pretty_assertions::assert_eq;

/// Helper to build a panel with `platform, year, week` followed by `columns`
fn create_panel(source: &str, columns: &[&str], rows: Vec<Vec<Cell>>) -> PanelTable {
    let mut names = vec!["platform".to_string(), "year".to_string(), "week".to_string()];
    names.extend(columns.iter().map(|c| c.to_string()));

    let mut table = PanelTable::new(source, names);
    for row in rows {
        table.push_row(row);
    }
    table
}

fn key_cells(platform: &str, year: i32, week: u32) -> Vec<Cell> {
    vec![
        Cell::from(platform),
        Cell::Number(year as f64),
        Cell::Number(week as f64),
    ]
}

fn row(platform: &str, year: i32, week: u32, values: &[Cell]) -> Vec<Cell> {
    let mut cells = key_cells(platform, year, week);
    cells.extend(values.iter().cloned());
    cells
}

/// Decentralization panel with one Alpha week
fn create_decentralization_panel() -> PanelTable {
    create_panel(
        "decentralization",
        &["inverse_hhi"],
        vec![row("Alpha", 2024, 10, &[Cell::Number(1.6)])],
    )
}

/// Market panel covering Alpha and Beta
fn create_market_panel() -> PanelTable {
    create_panel(
        "market",
        &["market_cap"],
        vec![
            row("Alpha", 2024, 10, &[Cell::Number(1e9)]),
            row("Beta", 2024, 10, &[Cell::Number(5e8)]),
        ],
    )
}

#[test]
fn test_merge_two_panels_marks_missing_not_zero() {
    let outcome = merge_panels(
        vec![
            create_decentralization_panel().into(),
            create_market_panel().into(),
        ],
        &MergeConfig::default(),
    )
    .unwrap();

    let panel = outcome.panel;
    assert_eq!(panel.len(), 2);

    let alpha = PanelKey::new("Alpha", 2024, 10);
    let beta = PanelKey::new("Beta", 2024, 10);

    assert_eq!(panel.get(&alpha, "inverse_hhi"), Some(&Cell::Number(1.6)));
    assert_eq!(panel.get(&alpha, "market_cap"), Some(&Cell::Number(1e9)));
    assert_eq!(panel.get(&beta, "market_cap"), Some(&Cell::Number(5e8)));
    assert_eq!(panel.get(&beta, "inverse_hhi"), Some(&Cell::Missing));

    assert_eq!(outcome.report.sources_merged, vec!["decentralization", "market"]);
    assert_eq!(outcome.report.zero_filled_cells, 0);
    assert_eq!(outcome.report.rows_out, 2);
}

#[test]
fn test_output_is_sorted_by_key() {
    let market = create_panel(
        "market",
        &["market_cap"],
        vec![
            row("Beta", 2024, 2, &[Cell::Number(2.0)]),
            row("Alpha", 2024, 3, &[Cell::Number(3.0)]),
            row("Alpha", 2023, 52, &[Cell::Number(1.0)]),
        ],
    );

    let outcome = merge_panels(vec![market.into()], &MergeConfig::default()).unwrap();
    let keys: Vec<String> = outcome.panel.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["Alpha 2023-W52", "Alpha 2024-W03", "Beta 2024-W02"]);
}

#[test]
fn test_every_input_key_appears_once() {
    let blocks = create_panel(
        "blocks",
        &["block_inverse_hhi"],
        vec![
            row("Alpha", 2024, 1, &[Cell::Number(2.0)]),
            row("Alpha", 2024, 2, &[Cell::Number(2.5)]),
        ],
    );
    let commits = create_panel(
        "commits",
        &["commit_inverse_hhi"],
        vec![
            row("Alpha", 2024, 2, &[Cell::Number(4.0)]),
            row("Gamma", 2024, 2, &[Cell::Number(1.0)]),
        ],
    );

    let outcome = merge_panels(vec![blocks.into(), commits.into()], &MergeConfig::default()).unwrap();
    let panel = outcome.panel;

    assert_eq!(panel.len(), 3);
    for (platform, week) in [("Alpha", 1), ("Alpha", 2), ("Gamma", 2)] {
        assert!(panel.row(&PanelKey::new(platform, 2024, week)).is_some());
    }

    let keys: Vec<&PanelKey> = panel.keys().collect();
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_merge_is_idempotent() {
    let sources = || {
        vec![
            PanelSource::from(create_decentralization_panel()),
            PanelSource::from(create_market_panel()),
        ]
    };

    let first = merge_panels(sources(), &MergeConfig::default()).unwrap();
    let second = merge_panels(sources(), &MergeConfig::default()).unwrap();
    assert_eq!(first.panel, second.panel);
    assert_eq!(first.report, second.report);
}

#[test]
fn test_platform_aliases_unify_keys() {
    let market = create_panel(
        "market",
        &["market_cap"],
        vec![row("Ethereum_Go", 2024, 10, &[Cell::Number(1.0)])],
    );
    let blocks = create_panel(
        "blocks",
        &["block_inverse_hhi"],
        vec![row(" Ethereum ", 2024, 10, &[Cell::Number(3.0)])],
    );

    let config = MergeConfig::default()
        .with_aliases(PlatformAliases::new().with_alias("Ethereum_Go", "Ethereum"));

    let outcome = merge_panels(vec![blocks.into(), market.into()], &config).unwrap();
    assert_eq!(outcome.panel.len(), 1);

    let key = PanelKey::new("Ethereum", 2024, 10);
    assert_eq!(outcome.panel.get(&key, "market_cap"), Some(&Cell::Number(1.0)));
    assert_eq!(outcome.panel.get(&key, "block_inverse_hhi"), Some(&Cell::Number(3.0)));
}

#[test]
fn test_key_column_aliases() {
    let mut table = PanelTable::new(
        "difficulty",
        vec![
            "chain".to_string(),
            "iso_year".to_string(),
            "iso_week".to_string(),
            "difficulty".to_string(),
        ],
    );
    table.push_row(row("Alpha", 2024, 10, &[Cell::Number(7.0)]));

    let outcome = merge_panels(vec![table.into()], &MergeConfig::default()).unwrap();
    let key = PanelKey::new("Alpha", 2024, 10);
    assert_eq!(outcome.panel.get(&key, "difficulty"), Some(&Cell::Number(7.0)));
}

#[test]
fn test_column_collision_is_renamed() {
    let blocks = create_panel(
        "blocks",
        &["entropy"],
        vec![row("Alpha", 2024, 10, &[Cell::Number(0.5)])],
    );
    let commits = create_panel(
        "commits",
        &["entropy"],
        vec![row("Alpha", 2024, 10, &[Cell::Number(0.9)])],
    );

    let outcome = merge_panels(vec![blocks.into(), commits.into()], &MergeConfig::default()).unwrap();
    let key = PanelKey::new("Alpha", 2024, 10);

    assert_eq!(outcome.panel.get(&key, "entropy"), Some(&Cell::Number(0.5)));
    assert_eq!(outcome.panel.get(&key, "entropy_commits"), Some(&Cell::Number(0.9)));
    assert_eq!(
        outcome.report.renamed_columns,
        vec![ColumnRename {
            source: "commits".to_string(),
            from: "entropy".to_string(),
            to: "entropy_commits".to_string(),
        }]
    );
}

#[test]
fn test_duplicate_key_is_rejected_by_default() {
    let market = create_panel(
        "market",
        &["price"],
        vec![
            row("Alpha", 2024, 10, &[Cell::Number(1.0)]),
            row("Alpha", 2024, 10, &[Cell::Number(2.0)]),
        ],
    );

    let err = merge_panels(vec![market.into()], &MergeConfig::default()).unwrap_err();
    match err {
        MergeError::KeyCollision { panel, duplicates } => {
            assert_eq!(panel, "market");
            assert_eq!(duplicates.len(), 1);
            assert_eq!(duplicates[0].key, PanelKey::new("Alpha", 2024, 10));
            assert_eq!(duplicates[0].occurrences, 2);
        }
        other => panic!("expected KeyCollision, got {:?}", other),
    }
}

#[test]
fn test_keep_first_policy_is_reported() {
    let market = create_panel(
        "market",
        &["price"],
        vec![
            row("Alpha", 2024, 10, &[Cell::Number(1.0)]),
            row("Alpha", 2024, 10, &[Cell::Number(2.0)]),
            row("Alpha", 2024, 11, &[Cell::Number(3.0)]),
        ],
    );

    let config = MergeConfig::default().with_duplicate_policy(DuplicatePolicy::KeepFirst);
    let outcome = merge_panels(vec![market.into()], &config).unwrap();

    let key = PanelKey::new("Alpha", 2024, 10);
    assert_eq!(outcome.panel.get(&key, "price"), Some(&Cell::Number(1.0)));
    assert_eq!(outcome.panel.len(), 2);
    assert_eq!(outcome.report.duplicates_removed, 1);
    assert_eq!(outcome.report.duplicate_keys.len(), 1);
}

#[test]
fn test_alias_created_duplicate_is_a_collision() {
    let market = create_panel(
        "market",
        &["price"],
        vec![
            row("Ethereum_Go", 2024, 10, &[Cell::Number(1.0)]),
            row("Ethereum", 2024, 10, &[Cell::Number(2.0)]),
        ],
    );

    let config = MergeConfig::default()
        .with_aliases(PlatformAliases::new().with_alias("Ethereum_Go", "Ethereum"));
    let result = merge_panels(vec![market.into()], &config);
    assert!(matches!(result, Err(MergeError::KeyCollision { .. })));
}

#[test]
fn test_schema_mismatch_names_missing_keys() {
    let mut table = PanelTable::new("prices", vec!["platform".to_string(), "price".to_string()]);
    table.push_row(vec![Cell::from("Alpha"), Cell::Number(1.0)]);

    let err = merge_panels(vec![table.into()], &MergeConfig::default()).unwrap_err();
    match err {
        MergeError::SchemaMismatch { panel, missing } => {
            assert_eq!(panel, "prices");
            assert_eq!(missing, vec!["year", "week"]);
        }
        other => panic!("expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_unavailable_source_is_skipped_and_reported() {
    let outcome = merge_panels(
        vec![
            create_decentralization_panel().into(),
            PanelSource::Unavailable {
                source: "difficulty".to_string(),
                reason: "file not found".to_string(),
            },
        ],
        &MergeConfig::default(),
    )
    .unwrap();

    assert_eq!(outcome.panel.len(), 1);
    assert_eq!(outcome.report.sources_merged, vec!["decentralization"]);
    assert_eq!(outcome.report.sources_skipped.len(), 1);
    assert_eq!(outcome.report.sources_skipped[0].source, "difficulty");
}

#[test]
fn test_duplicate_source_names_are_rejected() {
    let result = merge_panels(
        vec![create_market_panel().into(), create_market_panel().into()],
        &MergeConfig::default(),
    );
    assert!(matches!(result, Err(MergeError::DuplicateSource(name)) if name == "market"));
}

#[test]
fn test_rows_with_missing_key_are_dropped_and_counted() {
    let market = create_panel(
        "market",
        &["price"],
        vec![
            row("Alpha", 2024, 10, &[Cell::Number(1.0)]),
            vec![Cell::Missing, Cell::Number(2024.0), Cell::Number(11.0), Cell::Number(2.0)],
            vec![Cell::from("Alpha"), Cell::Number(2024.0), Cell::Missing, Cell::Number(3.0)],
        ],
    );

    let outcome = merge_panels(vec![market.into()], &MergeConfig::default()).unwrap();
    assert_eq!(outcome.panel.len(), 1);
    assert_eq!(outcome.report.rows_missing_key, 2);
}

#[test]
fn test_invalid_week_is_rejected() {
    // 2021 has only 52 ISO weeks
    let market = create_panel(
        "market",
        &["price"],
        vec![row("Alpha", 2021, 53, &[Cell::Number(1.0)])],
    );

    let result = merge_panels(vec![market.into()], &MergeConfig::default());
    assert!(matches!(result, Err(MergeError::InvalidKey { row: 0, .. })));
}

#[test]
fn test_ragged_row_is_rejected() {
    let market = create_panel(
        "market",
        &["price"],
        vec![key_cells("Alpha", 2024, 10)],
    );

    let result = merge_panels(vec![market.into()], &MergeConfig::default());
    assert!(matches!(
        result,
        Err(MergeError::RaggedRow { expected: 4, found: 3, .. })
    ));
}

#[test]
fn test_count_columns_are_zero_filled_measures_are_not() {
    let blocks = create_panel(
        "blocks",
        &["block_inverse_hhi", "block_total_events"],
        vec![row("Alpha", 2024, 10, &[Cell::Number(1.6), Cell::Number(4.0)])],
    )
    .with_count_columns(&["block_total_events"]);

    let outcome = merge_panels(
        vec![blocks.into(), create_market_panel().into()],
        &MergeConfig::default(),
    )
    .unwrap();

    let beta = PanelKey::new("Beta", 2024, 10);
    assert_eq!(outcome.panel.get(&beta, "block_total_events"), Some(&Cell::Number(0.0)));
    assert_eq!(outcome.panel.get(&beta, "block_inverse_hhi"), Some(&Cell::Missing));
    assert_eq!(outcome.report.zero_filled_cells, 1);

    let column = &outcome.panel.columns[outcome.panel.column_index("block_total_events").unwrap()];
    assert_eq!(column.kind, ColumnKind::Count);
}

#[test]
fn test_config_count_columns_apply_after_renaming() {
    let proposals = create_panel(
        "proposals",
        &["proposal_count"],
        vec![row("Alpha", 2024, 10, &[Cell::Number(3.0)])],
    );

    let mut config = MergeConfig::default();
    config.count_columns = vec!["proposal_count".to_string()];

    let outcome = merge_panels(
        vec![proposals.into(), create_market_panel().into()],
        &config,
    )
    .unwrap();

    let beta = PanelKey::new("Beta", 2024, 10);
    assert_eq!(outcome.panel.get(&beta, "proposal_count"), Some(&Cell::Number(0.0)));
}

#[test]
fn test_scaffold_balances_the_panel() {
    let outcome = merge_panels(
        vec![
            balanced_scaffold(&["Alpha", "Beta"], 2024..=2024).into(),
            create_market_panel().into(),
        ],
        &MergeConfig::default(),
    )
    .unwrap();

    assert_eq!(outcome.panel.len(), 2 * 52);
    assert!(coverage_gaps(&outcome.panel).is_empty());

    let key = PanelKey::new("Beta", 2024, 11);
    assert_eq!(outcome.panel.get(&key, "market_cap"), Some(&Cell::Missing));
}

#[test]
fn test_stack_then_merge() {
    let early = create_panel(
        "market_2023",
        &["price"],
        vec![row("Alpha", 2023, 52, &[Cell::Number(1.0)])],
    );
    let mut late = PanelTable::new(
        "market_2024",
        vec![
            "Platform".to_string(),
            "year".to_string(),
            "week".to_string(),
            "volume".to_string(),
            "price".to_string(),
        ],
    );
    late.push_row(row("Alpha", 2024, 1, &[Cell::Number(9.0), Cell::Number(2.0)]));

    let stacked = stack_panels("market", &[early, late], &KeyColumns::default()).unwrap();
    assert_eq!(stacked.columns, vec!["platform", "year", "week", "price", "volume"]);
    assert_eq!(stacked.rows[0][4], Cell::Missing);
    assert_eq!(stacked.rows[1][3], Cell::Number(2.0));

    let outcome = merge_panels(vec![stacked.into()], &MergeConfig::default()).unwrap();
    assert_eq!(outcome.panel.len(), 2);
}

#[test]
fn test_to_records_renders_missing_as_null() {
    let outcome = merge_panels(
        vec![
            create_decentralization_panel().into(),
            create_market_panel().into(),
        ],
        &MergeConfig::default(),
    )
    .unwrap();

    let records = outcome.panel.to_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["platform"], "Beta");
    assert!(records[1]["inverse_hhi"].is_null());
    assert_eq!(
        records[0].keys().cloned().collect::<Vec<_>>(),
        vec!["platform", "year", "week", "inverse_hhi", "market_cap"]
    );
}

#[test]
fn test_render_terminal_report_lists_skips_and_renames() {
    let report = MergeReport {
        sources_merged: vec!["blocks".to_string(), "commits".to_string()],
        sources_skipped: vec![SkippedSource {
            source: "difficulty".to_string(),
            reason: "file not found".to_string(),
        }],
        renamed_columns: vec![ColumnRename {
            source: "commits".to_string(),
            from: "entropy".to_string(),
            to: "entropy_commits".to_string(),
        }],
        rows_out: 3,
        ..Default::default()
    };

    let rendered = render_terminal_report(&report, &[]);
    assert!(rendered.contains("blocks, commits"));
    assert!(rendered.contains("difficulty"));
    assert!(rendered.contains("entropy -> entropy_commits"));
    assert!(rendered.contains("KEYS UNIQUE"));
}
