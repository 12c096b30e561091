//! Normalization and cleaning integration tests
//!
//! Tests the path from raw bench-script data to the canonical table.
//!
//! # Test Coverage
//!
//! - Input shapes: mappings, matrices, sequences, files
//! - File parsing: CSV, whitespace-delimited text, plain lines
//! - Missing-value policies: fill, interpolate, drop
//! - Numeric promotion of text columns
//! - CSV output formatting

use bench_recorder::clean::{clean, MissingPolicy};
use bench_recorder::config::DataConfig;
use bench_recorder::normalize::{normalize, DataInput, MappingValue};
use bench_recorder::storage;
use bench_recorder::table::{Cell, Column, ColumnKind, DataTable};
use tempfile::TempDir;

// =============================================================================
// Test Helper Functions
// =============================================================================

/// Default data configuration
fn data_config() -> DataConfig {
    DataConfig::default()
}

/// Data configuration with the given missing-value policy
fn config_with_policy(policy: MissingPolicy) -> DataConfig {
    DataConfig {
        handle_missing: policy,
        ..DataConfig::default()
    }
}

/// Single numeric column wrapped in a table
fn one_column_table(cells: Vec<Cell>) -> DataTable {
    DataTable::from_columns(vec![Column::numeric("reading", cells)]).unwrap()
}

/// Numeric values of the named column, panicking on missing cells
fn numeric_cells(table: &DataTable, name: &str) -> Vec<f64> {
    table
        .column(name)
        .unwrap()
        .cells()
        .iter()
        .map(|cell| cell.as_number().unwrap())
        .collect()
}

// =============================================================================
// Input Shape Tests
// =============================================================================

#[test]
fn mapping_of_scalars_becomes_one_row() {
    let input = DataInput::Mapping(vec![
        ("a".to_string(), MappingValue::scalar(1.0)),
        ("b".to_string(), MappingValue::scalar(2.0)),
    ]);
    let table = normalize(input, None, &data_config()).unwrap();

    assert_eq!(table.row_count(), 1);
    assert_eq!(table.column_count(), 2);
    assert_eq!(table.column_names(), vec!["a", "b"]);
}

#[test]
fn matrix_with_headers_keeps_column_order() {
    let headers = vec!["voltage".to_string(), "current".to_string()];
    let input = DataInput::Matrix(vec![vec![0.0, 0.001], vec![0.1, 0.002], vec![0.2, 0.004]]);
    let table = normalize(input, Some(&headers), &data_config()).unwrap();

    assert_eq!(table.column_names(), vec!["voltage", "current"]);
    assert_eq!(numeric_cells(&table, "voltage"), vec![0.0, 0.1, 0.2]);
    assert_eq!(numeric_cells(&table, "current"), vec![0.001, 0.002, 0.004]);
}

#[test]
fn flat_sequence_becomes_value_column() {
    let table = normalize(DataInput::from(vec![1.5, 2.5]), None, &data_config()).unwrap();
    assert_eq!(table.column_names(), vec!["value"]);
    assert_eq!(numeric_cells(&table, "value"), vec![1.5, 2.5]);
}

// =============================================================================
// File Parsing Tests
// =============================================================================

#[test]
fn csv_file_is_parsed_with_typed_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sweep.csv");
    std::fs::write(&path, "voltage,current\n0.0,0.001\n0.1,\n0.2,0.004\n").unwrap();

    let table = normalize(DataInput::File(path), None, &data_config()).unwrap();

    assert_eq!(table.column_names(), vec!["voltage", "current"]);
    assert_eq!(table.row_count(), 3);
    let current = table.column("current").unwrap();
    assert_eq!(current.kind(), ColumnKind::Numeric);
    assert!(current.cells()[1].is_missing());
}

#[test]
fn ragged_csv_rows_are_padded_with_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "a,b\n1\n2,3\n").unwrap();

    let table = normalize(DataInput::File(path), None, &data_config()).unwrap();

    assert_eq!(table.column_count(), 2);
    assert!(table.column("b").unwrap().cells()[0].is_missing());
    assert_eq!(table.column("b").unwrap().cells()[1], Cell::Number(3.0));
}

#[test]
fn whitespace_text_file_is_numeric() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log.txt");
    std::fs::write(&path, "# poller output\ntime power\n0.0 -3.1\n1.0 -3.0\n").unwrap();

    let table = normalize(DataInput::File(path), None, &data_config()).unwrap();

    assert_eq!(table.column_names(), vec!["time", "power"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(numeric_cells(&table, "power"), vec![-3.1, -3.0]);
}

#[test]
fn unknown_extension_falls_back_to_plain_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.log");
    std::fs::write(&path, "alignment ok\nsweep done\n").unwrap();

    let table = normalize(DataInput::File(path), None, &data_config()).unwrap();

    assert_eq!(table.column_names(), vec!["value"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.column("value").unwrap().cells()[0],
        Cell::Text("alignment ok".to_string())
    );
}

// =============================================================================
// Cleaning Tests
// =============================================================================

#[test]
fn fill_policy_replaces_missing_with_column_mean() {
    let table = one_column_table(vec![Cell::Number(1.0), Cell::Missing, Cell::Number(3.0)]);
    let cleaned = clean(table, &config_with_policy(MissingPolicy::Fill));

    assert_eq!(numeric_cells(&cleaned, "reading"), vec![1.0, 2.0, 3.0]);
}

#[test]
fn fill_policy_uses_mode_for_text_columns() {
    let table = DataTable::from_columns(vec![Column::text(
        "stage",
        vec![
            Cell::Text("sweep".to_string()),
            Cell::Missing,
            Cell::Text("sweep".to_string()),
            Cell::Text("align".to_string()),
        ],
    )])
    .unwrap();
    let cleaned = clean(table, &config_with_policy(MissingPolicy::Fill));

    assert_eq!(
        cleaned.column("stage").unwrap().cells()[1],
        Cell::Text("sweep".to_string())
    );
}

#[test]
fn interpolate_policy_bridges_gaps_and_pads_the_tail() {
    let table = one_column_table(vec![
        Cell::Number(10.0),
        Cell::Missing,
        Cell::Number(30.0),
        Cell::Missing,
    ]);
    let cleaned = clean(table, &config_with_policy(MissingPolicy::Interpolate));

    assert_eq!(
        numeric_cells(&cleaned, "reading"),
        vec![10.0, 20.0, 30.0, 30.0]
    );
}

#[test]
fn drop_policy_removes_rows_with_any_missing_cell() {
    let table = DataTable::from_columns(vec![
        Column::numeric(
            "a",
            vec![Cell::Number(1.0), Cell::Missing, Cell::Number(3.0)],
        ),
        Column::numeric(
            "b",
            vec![Cell::Number(4.0), Cell::Number(5.0), Cell::Number(6.0)],
        ),
    ])
    .unwrap();
    let cleaned = clean(table, &config_with_policy(MissingPolicy::Drop));

    assert_eq!(cleaned.row_count(), 2);
    assert_eq!(numeric_cells(&cleaned, "a"), vec![1.0, 3.0]);
    assert_eq!(numeric_cells(&cleaned, "b"), vec![4.0, 6.0]);
}

#[test]
fn fully_convertible_text_columns_are_promoted() {
    let table = DataTable::from_columns(vec![Column::text(
        "raw",
        vec![
            Cell::Text("1.5".to_string()),
            Cell::Text("2.5".to_string()),
        ],
    )])
    .unwrap();
    let cleaned = clean(table, &data_config());

    assert_eq!(cleaned.column("raw").unwrap().kind(), ColumnKind::Numeric);
    assert_eq!(numeric_cells(&cleaned, "raw"), vec![1.5, 2.5]);
}

#[test]
fn mixed_text_columns_are_left_alone() {
    let table = DataTable::from_columns(vec![Column::text(
        "raw",
        vec![
            Cell::Text("1.5".to_string()),
            Cell::Text("fault".to_string()),
        ],
    )])
    .unwrap();
    let cleaned = clean(table, &data_config());

    assert_eq!(cleaned.column("raw").unwrap().kind(), ColumnKind::Text);
}

#[test]
fn promotion_respects_the_auto_detect_switch() {
    let table = DataTable::from_columns(vec![Column::text(
        "raw",
        vec![Cell::Text("1.5".to_string())],
    )])
    .unwrap();
    let config = DataConfig {
        auto_detect_types: false,
        ..DataConfig::default()
    };
    let cleaned = clean(table, &config);

    assert_eq!(cleaned.column("raw").unwrap().kind(), ColumnKind::Text);
}

// =============================================================================
// CSV Output Tests
// =============================================================================

#[test]
fn written_csv_uses_significant_digit_formatting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");
    let table = DataTable::from_columns(vec![Column::numeric(
        "ratio",
        vec![Cell::Number(2.0 / 3.0), Cell::Missing],
    )])
    .unwrap();

    let config = DataConfig {
        numeric_precision: 3,
        ..DataConfig::default()
    };
    storage::write_table_csv(&table, &path, &config).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "ratio\n0.667\n\"\"\n");
}

#[test]
fn written_csv_round_trips_through_the_reader() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roundtrip.csv");
    let table = DataTable::from_columns(vec![
        Column::from_values("voltage", vec![0.0, 0.1, 0.2]),
        Column::text(
            "stage",
            vec![
                Cell::Text("warmup".to_string()),
                Cell::Text("sweep".to_string()),
                Cell::Missing,
            ],
        ),
    ])
    .unwrap();

    storage::write_table_csv(&table, &path, &data_config()).unwrap();
    let reread = normalize(DataInput::File(path), None, &data_config()).unwrap();

    assert_eq!(reread.column_names(), vec!["voltage", "stage"]);
    assert_eq!(numeric_cells(&reread, "voltage"), vec![0.0, 0.1, 0.2]);
    assert!(reread.column("stage").unwrap().cells()[2].is_missing());
}
