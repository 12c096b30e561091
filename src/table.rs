//! Canonical in-memory table for recorded measurement data.
//!
//! Every accepted input shape is normalized into a [`DataTable`]: an ordered
//! collection of named, equal-length columns. Columns are either numeric or
//! textual, and any cell may be missing. All downstream stages (cleaning,
//! statistics, CSV output, chart rendering, metadata preview) operate on this
//! one representation.

use serde_json::Value;

use crate::error::{AppResult, RecorderError};

/// A single table cell.
///
/// Numeric cells never hold NaN; the [`Cell::Missing`] variant is the only
/// missing-value marker in the crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A finite or infinite floating point value.
    Number(f64),
    /// A textual value.
    Text(String),
    /// An absent value.
    Missing,
}

impl Cell {
    /// Returns true for the [`Cell::Missing`] variant.
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Returns the numeric value, if this cell holds one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the textual value, if this cell holds one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Converts the cell to a JSON value. Missing cells and non-representable
    /// numbers (infinities) become JSON null.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Number(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(value) => Value::String(value.clone()),
            Cell::Missing => Value::Null,
        }
    }
}

impl From<f64> for Cell {
    /// NaN is mapped to [`Cell::Missing`] so NaN never enters a table.
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(value)
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(number) => Cell::from(number),
            None => Cell::Missing,
        }
    }
}

/// Parses a free-form token as a number, treating a NaN result as absent.
pub(crate) fn parse_numeric(text: &str) -> Option<f64> {
    let parsed = text.trim().parse::<f64>().ok()?;
    if parsed.is_nan() {
        None
    } else {
        Some(parsed)
    }
}

/// The declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Cells are [`Cell::Number`] or [`Cell::Missing`].
    Numeric,
    /// Cells are [`Cell::Text`] or [`Cell::Missing`].
    Text,
}

/// A named column of cells with a declared kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) kind: ColumnKind,
    pub(crate) cells: Vec<Cell>,
}

impl Column {
    /// Creates a numeric column from pre-built cells.
    pub fn numeric(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnKind::Numeric,
            cells,
        }
    }

    /// Creates a textual column from pre-built cells.
    pub fn text(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnKind::Text,
            cells,
        }
    }

    /// Creates a numeric column from raw values. NaN entries become missing.
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        Column::numeric(name, values.into_iter().map(Cell::from).collect())
    }

    /// Creates a column whose kind is inferred from its cells.
    ///
    /// A column is numeric when every present cell is a number; this includes
    /// a column with no present cells, which is how padded gaps behave.
    pub fn inferred(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let kind = if cells.iter().all(|cell| !matches!(cell, Cell::Text(_))) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        };
        Column {
            name: name.into(),
            kind,
            cells,
        }
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared column kind.
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// True when the column kind is numeric.
    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    /// The cells of this column in row order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of rows in this column.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All present numeric values in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_number).collect()
    }
}

/// An ordered set of named, equal-length columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub(crate) columns: Vec<Column>,
}

impl DataTable {
    /// Creates an empty table with no columns and no rows.
    pub fn new() -> Self {
        DataTable::default()
    }

    /// Builds a table from columns, enforcing unique names and equal lengths.
    pub fn from_columns(columns: Vec<Column>) -> AppResult<Self> {
        let mut seen: Vec<&str> = Vec::with_capacity(columns.len());
        for column in &columns {
            if seen.contains(&column.name.as_str()) {
                return Err(RecorderError::validation(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
            seen.push(column.name.as_str());
        }
        if let Some(first) = columns.first() {
            let rows = first.len();
            for column in &columns {
                if column.len() != rows {
                    return Err(RecorderError::validation(format!(
                        "column '{}' has {} rows but the table has {}",
                        column.name,
                        column.len(),
                        rows
                    )));
                }
            }
        }
        Ok(DataTable { columns })
    }

    /// Number of rows in the table.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns in the table.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.row_count() == 0
    }

    /// The columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Looks up a column by position.
    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// The cells of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<&Cell> {
        self.columns
            .iter()
            .map(|column| column.cells.get(index).unwrap_or(&Cell::Missing))
            .collect()
    }

    /// Replaces every column name. The replacement list must match the column
    /// count exactly and contain no duplicates.
    pub fn rename_columns(&mut self, names: &[String]) -> AppResult<()> {
        if names.len() != self.columns.len() {
            return Err(RecorderError::validation(format!(
                "column_names length ({}) does not match table columns ({})",
                names.len(),
                self.columns.len()
            )));
        }
        for (index, name) in names.iter().enumerate() {
            if names[..index].contains(name) {
                return Err(RecorderError::validation(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }
        for (column, name) in self.columns.iter_mut().zip(names) {
            column.name.clone_from(name);
        }
        Ok(())
    }

    /// The first `limit` rows as JSON records, keyed by column name.
    pub fn head(&self, limit: usize) -> Vec<serde_json::Map<String, Value>> {
        let rows = self.row_count().min(limit);
        (0..rows)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| (column.name.clone(), column.cells[row].to_json()))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_values_become_missing_cells() {
        assert_eq!(Cell::from(f64::NAN), Cell::Missing);
        assert_eq!(Cell::from(1.5), Cell::Number(1.5));
    }

    #[test]
    fn inferred_kind_requires_all_present_cells_numeric() {
        let numeric = Column::inferred("a", vec![Cell::Number(1.0), Cell::Missing]);
        assert_eq!(numeric.kind(), ColumnKind::Numeric);

        let text = Column::inferred("b", vec![Cell::Number(1.0), Cell::Text("x".into())]);
        assert_eq!(text.kind(), ColumnKind::Text);

        let padded = Column::inferred("c", vec![Cell::Missing, Cell::Missing]);
        assert_eq!(padded.kind(), ColumnKind::Numeric);
    }

    #[test]
    fn from_columns_rejects_duplicate_names() {
        let result = DataTable::from_columns(vec![
            Column::from_values("a", vec![1.0]),
            Column::from_values("a", vec![2.0]),
        ]);
        assert!(matches!(result, Err(RecorderError::Validation(_))));
    }

    #[test]
    fn from_columns_rejects_unequal_lengths() {
        let result = DataTable::from_columns(vec![
            Column::from_values("a", vec![1.0, 2.0]),
            Column::from_values("b", vec![3.0]),
        ]);
        assert!(matches!(result, Err(RecorderError::Validation(_))));
    }

    #[test]
    fn rename_requires_exact_count() {
        let mut table = DataTable::from_columns(vec![
            Column::from_values("a", vec![1.0]),
            Column::from_values("b", vec![2.0]),
        ])
        .unwrap();
        let err = table.rename_columns(&["only_one".to_string()]);
        assert!(matches!(err, Err(RecorderError::Validation(_))));

        table
            .rename_columns(&["x".to_string(), "y".to_string()])
            .unwrap();
        assert_eq!(table.column_names(), vec!["x", "y"]);
    }

    #[test]
    fn head_reports_missing_cells_as_null() {
        let table = DataTable::from_columns(vec![Column::numeric(
            "a",
            vec![Cell::Number(1.0), Cell::Missing],
        )])
        .unwrap();
        let preview = table.head(5);
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0]["a"], Value::from(1.0));
        assert_eq!(preview[1]["a"], Value::Null);
    }

    #[test]
    fn empty_table_has_no_rows() {
        let table = DataTable::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert!(table.head(5).is_empty());
    }
}
