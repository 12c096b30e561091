//! Normalization of heterogeneous inputs into the canonical table.
//!
//! A dataset can be handed over in any of the shapes produced by bench
//! scripts: a file path, an already-built table, a numeric matrix, named
//! columns, per-row records, bare rows, a flat sequence, or a single value.
//! [`normalize`] converts each of them into a [`DataTable`] with named,
//! equal-length columns so the rest of the pipeline has one input shape.

use std::path::PathBuf;

use crate::config::DataConfig;
use crate::error::AppResult;
use crate::storage;
use crate::table::{Cell, Column, DataTable};

/// A value attached to a mapping key: a single cell or a whole column.
#[derive(Debug, Clone)]
pub enum MappingValue {
    /// One cell, broadcast when the mapping also carries series.
    Scalar(Cell),
    /// One column of cells.
    Series(Vec<Cell>),
}

impl MappingValue {
    /// Wraps a single value.
    pub fn scalar(value: impl Into<Cell>) -> Self {
        MappingValue::Scalar(value.into())
    }

    /// Wraps a column of values.
    pub fn series<T: Into<Cell>>(values: Vec<T>) -> Self {
        MappingValue::Series(values.into_iter().map(Into::into).collect())
    }
}

/// Every input shape accepted by the recorder.
#[derive(Debug, Clone)]
pub enum DataInput {
    /// A file on disk, parsed by extension.
    File(PathBuf),
    /// An already-canonical table, passed through unchanged.
    Table(DataTable),
    /// A dense numeric matrix in row-major order. NaN entries are missing.
    Matrix(Vec<Vec<f64>>),
    /// Named values in insertion order, scalar or series per key.
    Mapping(Vec<(String, MappingValue)>),
    /// One record per row as name/value pairs. Keys are unioned across
    /// records in first-seen order.
    Records(Vec<Vec<(String, Cell)>>),
    /// Bare rows of cells, named positionally unless headers are supplied.
    Rows(Vec<Vec<Cell>>),
    /// A flat sequence, normalized as a single column.
    Sequence(Vec<Cell>),
    /// A single value, normalized as a one-cell table.
    Scalar(Cell),
}

impl From<DataTable> for DataInput {
    fn from(table: DataTable) -> Self {
        DataInput::Table(table)
    }
}

impl From<PathBuf> for DataInput {
    fn from(path: PathBuf) -> Self {
        DataInput::File(path)
    }
}

impl From<&std::path::Path> for DataInput {
    fn from(path: &std::path::Path) -> Self {
        DataInput::File(path.to_path_buf())
    }
}

impl From<Vec<Vec<f64>>> for DataInput {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        DataInput::Matrix(rows)
    }
}

impl From<Vec<f64>> for DataInput {
    fn from(values: Vec<f64>) -> Self {
        DataInput::Sequence(values.into_iter().map(Cell::from).collect())
    }
}

impl From<f64> for DataInput {
    fn from(value: f64) -> Self {
        DataInput::Scalar(Cell::from(value))
    }
}

/// Converts any accepted input shape into the canonical table.
///
/// `headers` names the columns of the headerless shapes ([`DataInput::Matrix`]
/// and [`DataInput::Rows`]) when its length matches the row width; all other
/// shapes carry their own names.
pub fn normalize(
    input: DataInput,
    headers: Option<&[String]>,
    config: &DataConfig,
) -> AppResult<DataTable> {
    match input {
        DataInput::File(path) => storage::read_table_file(&path, config),
        DataInput::Table(table) => Ok(table),
        DataInput::Matrix(rows) => {
            let cell_rows: Vec<Vec<Cell>> = rows
                .into_iter()
                .map(|row| row.into_iter().map(Cell::from).collect())
                .collect();
            rows_to_table(cell_rows, headers)
        }
        DataInput::Mapping(pairs) => mapping_to_table(pairs),
        DataInput::Records(records) => records_to_table(records),
        DataInput::Rows(rows) => rows_to_table(rows, headers),
        DataInput::Sequence(cells) => {
            DataTable::from_columns(vec![Column::inferred("value", cells)])
        }
        DataInput::Scalar(cell) => {
            DataTable::from_columns(vec![Column::inferred("value", vec![cell])])
        }
    }
}

/// Builds a table from bare rows, padding short rows with missing cells and
/// naming columns positionally unless matching headers are given.
fn rows_to_table(rows: Vec<Vec<Cell>>, headers: Option<&[String]>) -> AppResult<DataTable> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Ok(DataTable::new());
    }

    let named = headers.filter(|names| names.len() == width);
    let columns = (0..width)
        .map(|index| {
            let name = named.map_or_else(|| format!("col_{index}"), |names| names[index].clone());
            let cells: Vec<Cell> = rows
                .iter()
                .map(|row| row.get(index).cloned().unwrap_or(Cell::Missing))
                .collect();
            Column::inferred(name, cells)
        })
        .collect();

    DataTable::from_columns(columns)
}

/// Builds a table from named values.
///
/// When no value is a series the mapping becomes a single row. Otherwise each
/// key becomes a column: series are padded to the longest series and scalars
/// are broadcast to that length.
fn mapping_to_table(pairs: Vec<(String, MappingValue)>) -> AppResult<DataTable> {
    if pairs.is_empty() {
        return Ok(DataTable::new());
    }

    let has_series = pairs
        .iter()
        .any(|(_, value)| matches!(value, MappingValue::Series(_)));

    // A mapping of bare scalars is one row; otherwise series set the height.
    let rows = if has_series {
        pairs
            .iter()
            .map(|(_, value)| match value {
                MappingValue::Series(cells) => cells.len(),
                MappingValue::Scalar(_) => 0,
            })
            .max()
            .unwrap_or(0)
    } else {
        1
    };

    let columns = pairs
        .into_iter()
        .map(|(name, value)| {
            let cells = match value {
                MappingValue::Scalar(cell) => vec![cell; rows],
                MappingValue::Series(mut cells) => {
                    cells.resize(rows, Cell::Missing);
                    cells
                }
            };
            Column::inferred(name, cells)
        })
        .collect();

    DataTable::from_columns(columns)
}

/// Builds a table from per-row records, unioning keys in first-seen order and
/// leaving absent keys missing.
fn records_to_table(records: Vec<Vec<(String, Cell)>>) -> AppResult<DataTable> {
    let mut names: Vec<String> = Vec::new();
    for record in &records {
        for (key, _) in record {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }
    if names.is_empty() {
        return Ok(DataTable::new());
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let cells: Vec<Cell> = records
                .iter()
                .map(|record| {
                    record
                        .iter()
                        .find(|(key, _)| *key == name)
                        .map(|(_, cell)| cell.clone())
                        .unwrap_or(Cell::Missing)
                })
                .collect();
            Column::inferred(name, cells)
        })
        .collect();

    DataTable::from_columns(columns)
}
