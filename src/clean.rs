//! Table cleaning: missing-cell policies and type promotion.
//!
//! Cleaning runs after normalization and applies two steps in order. First
//! the configured [`MissingPolicy`] resolves missing cells; then, when type
//! detection is enabled, text columns whose every present value parses as a
//! number are promoted to numeric columns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::DataConfig;
use crate::table::{parse_numeric, Cell, Column, ColumnKind, DataTable};

/// Policy applied to missing cells during cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Remove every row containing a missing cell.
    Drop,
    /// Fill numeric columns with the column mean and text columns with the
    /// column mode, or `Unknown` when no mode exists.
    #[default]
    Fill,
    /// Linearly interpolate interior gaps of numeric columns. Leading gaps
    /// stay missing; trailing gaps take the last present value.
    Interpolate,
}

/// Applies the configured cleaning steps and returns the cleaned table.
pub fn clean(table: DataTable, config: &DataConfig) -> DataTable {
    let mut table = match config.handle_missing {
        MissingPolicy::Drop => drop_missing_rows(table),
        MissingPolicy::Fill => fill_missing(table),
        MissingPolicy::Interpolate => interpolate_missing(table),
    };
    if config.auto_detect_types {
        promote_numeric_text(&mut table);
    }
    table
}

/// Removes every row that has at least one missing cell.
fn drop_missing_rows(mut table: DataTable) -> DataTable {
    let keep: Vec<usize> = (0..table.row_count())
        .filter(|&row| {
            table
                .columns
                .iter()
                .all(|column| !column.cells[row].is_missing())
        })
        .collect();

    for column in &mut table.columns {
        column.cells = keep.iter().map(|&row| column.cells[row].clone()).collect();
    }
    table
}

/// Fills missing cells in place: numeric columns with their mean, text
/// columns with their mode or `Unknown`.
fn fill_missing(mut table: DataTable) -> DataTable {
    for column in &mut table.columns {
        let fill = match column.kind {
            ColumnKind::Numeric => column_mean(column).map(Cell::Number),
            ColumnKind::Text => Some(Cell::Text(
                column_mode(column).unwrap_or_else(|| "Unknown".to_string()),
            )),
        };
        if let Some(fill) = fill {
            for cell in &mut column.cells {
                if cell.is_missing() {
                    *cell = fill.clone();
                }
            }
        }
    }
    table
}

/// Linearly interpolates interior gaps of every numeric column.
fn interpolate_missing(mut table: DataTable) -> DataTable {
    for column in &mut table.columns {
        if column.kind == ColumnKind::Numeric {
            interpolate_column(column);
        }
    }
    table
}

fn column_mean(column: &Column) -> Option<f64> {
    let values = column.numeric_values();
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    Some(values.iter().sum::<f64>() / count)
}

/// The most frequent present text value. Ties resolve to the smallest value
/// in lexicographic order.
fn column_mode(column: &Column) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for cell in &column.cells {
        if let Some(text) = cell.as_text() {
            *counts.entry(text).or_insert(0) += 1;
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (text, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((text, count));
        }
    }
    best.map(|(text, _)| text.to_string())
}

fn interpolate_column(column: &mut Column) {
    let values: Vec<Option<f64>> = column.cells.iter().map(Cell::as_number).collect();
    let present: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    let Some(&last) = present.last() else {
        return;
    };

    let mut filled = values.clone();
    for pair in present.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end > start + 1 {
            let (from, to) = match (values[start], values[end]) {
                (Some(from), Some(to)) => (from, to),
                _ => continue,
            };
            #[allow(clippy::cast_precision_loss)]
            let span = (end - start) as f64;
            for gap in start + 1..end {
                #[allow(clippy::cast_precision_loss)]
                let offset = (gap - start) as f64;
                filled[gap] = Some(from + (to - from) * offset / span);
            }
        }
    }
    for index in last + 1..filled.len() {
        filled[index] = values[last];
    }

    for (cell, value) in column.cells.iter_mut().zip(filled) {
        if let Some(value) = value {
            *cell = Cell::Number(value);
        }
    }
}

/// Promotes text columns whose every present value parses as a number.
/// Columns with no present values keep their kind.
fn promote_numeric_text(table: &mut DataTable) {
    for column in &mut table.columns {
        if column.kind != ColumnKind::Text {
            continue;
        }
        let present: Vec<&str> = column.cells.iter().filter_map(Cell::as_text).collect();
        if present.is_empty() {
            continue;
        }
        if present
            .iter()
            .all(|text| text.trim().parse::<f64>().is_ok())
        {
            for cell in &mut column.cells {
                if let Cell::Text(text) = cell {
                    *cell = parse_numeric(text).map_or(Cell::Missing, Cell::Number);
                }
            }
            column.kind = ColumnKind::Numeric;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(policy: MissingPolicy) -> DataConfig {
        DataConfig {
            handle_missing: policy,
            ..DataConfig::default()
        }
    }

    fn numeric_column(name: &str, cells: Vec<Cell>) -> Column {
        Column::numeric(name, cells)
    }

    #[test]
    fn drop_removes_rows_with_any_missing_cell() {
        let table = DataTable::from_columns(vec![
            numeric_column("a", vec![Cell::Number(1.0), Cell::Missing, Cell::Number(3.0)]),
            numeric_column(
                "b",
                vec![Cell::Number(4.0), Cell::Number(5.0), Cell::Number(6.0)],
            ),
        ])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Drop));
        assert_eq!(cleaned.row_count(), 2);
        assert_eq!(
            cleaned.column("b").unwrap().numeric_values(),
            vec![4.0, 6.0]
        );
    }

    #[test]
    fn fill_uses_column_mean_for_numeric_columns() {
        let table = DataTable::from_columns(vec![numeric_column(
            "a",
            vec![Cell::Number(1.0), Cell::Missing, Cell::Number(3.0)],
        )])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Fill));
        assert_eq!(
            cleaned.column("a").unwrap().numeric_values(),
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn fill_uses_mode_for_text_columns_with_lexicographic_ties() {
        let table = DataTable::from_columns(vec![Column::text(
            "status",
            vec![
                Cell::Text("pass".into()),
                Cell::Text("fail".into()),
                Cell::Missing,
            ],
        )])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Fill));
        assert_eq!(
            cleaned.column("status").unwrap().cells()[2],
            Cell::Text("fail".into())
        );
    }

    #[test]
    fn fill_uses_unknown_when_no_mode_exists() {
        let table = DataTable::from_columns(vec![Column::text(
            "status",
            vec![Cell::Missing, Cell::Missing],
        )])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Fill));
        assert_eq!(
            cleaned.column("status").unwrap().cells()[0],
            Cell::Text("Unknown".into())
        );
    }

    #[test]
    fn fill_leaves_all_missing_numeric_columns_untouched() {
        let table = DataTable::from_columns(vec![numeric_column(
            "a",
            vec![Cell::Missing, Cell::Missing],
        )])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Fill));
        assert!(cleaned.column("a").unwrap().cells()[0].is_missing());
    }

    #[test]
    fn interpolate_fills_interior_gaps_linearly() {
        let table = DataTable::from_columns(vec![numeric_column(
            "a",
            vec![Cell::Number(1.0), Cell::Missing, Cell::Number(3.0)],
        )])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Interpolate));
        assert_eq!(
            cleaned.column("a").unwrap().numeric_values(),
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn interpolate_keeps_leading_gaps_and_extends_trailing_values() {
        let table = DataTable::from_columns(vec![numeric_column(
            "a",
            vec![
                Cell::Missing,
                Cell::Number(2.0),
                Cell::Number(4.0),
                Cell::Missing,
            ],
        )])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Interpolate));
        let cells = cleaned.column("a").unwrap().cells();
        assert!(cells[0].is_missing());
        assert_eq!(cells[3], Cell::Number(4.0));
    }

    #[test]
    fn promotes_fully_numeric_text_columns() {
        let table = DataTable::from_columns(vec![Column::text(
            "reading",
            vec![Cell::Text("1.5".into()), Cell::Text("2.5".into())],
        )])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Drop));
        let reading = cleaned.column("reading").unwrap();
        assert_eq!(reading.kind(), ColumnKind::Numeric);
        assert_eq!(reading.numeric_values(), vec![1.5, 2.5]);
    }

    #[test]
    fn partially_numeric_text_columns_stay_text() {
        let table = DataTable::from_columns(vec![Column::text(
            "reading",
            vec![Cell::Text("1.5".into()), Cell::Text("overload".into())],
        )])
        .unwrap();

        let cleaned = clean(table, &config_with(MissingPolicy::Drop));
        assert_eq!(
            cleaned.column("reading").unwrap().kind(),
            ColumnKind::Text
        );
    }

    #[test]
    fn promotion_can_be_disabled() {
        let table = DataTable::from_columns(vec![Column::text(
            "reading",
            vec![Cell::Text("1.5".into())],
        )])
        .unwrap();

        let config = DataConfig {
            auto_detect_types: false,
            ..DataConfig::default()
        };
        let cleaned = clean(table, &config);
        assert_eq!(cleaned.column("reading").unwrap().kind(), ColumnKind::Text);
    }
}
