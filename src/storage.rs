//! Table file input and output.
//!
//! Writes the canonical table as a headed CSV file and reads the three file
//! shapes accepted as dataset input: `.csv` files, whitespace-delimited `.txt`
//! files, and anything else as raw text lines. Numeric CSV cells are written
//! with a configurable number of significant digits; missing cells are written
//! as empty fields.

use std::path::Path;

use crate::config::DataConfig;
use crate::error::{AppResult, RecorderError};
use crate::table::{parse_numeric, Cell, Column, DataTable};

/// Writes the table to `path` as a CSV file with a header row.
pub fn write_table_csv(table: &DataTable, path: &Path, config: &DataConfig) -> AppResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;

    for row in 0..table.row_count() {
        let record: Vec<String> = table
            .row(row)
            .into_iter()
            .map(|cell| match cell {
                Cell::Number(value) => format_significant(*value, config.numeric_precision),
                Cell::Text(value) => value.clone(),
                Cell::Missing => String::new(),
            })
            .collect();
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .map_err(|err| RecorderError::io(path, err))?;
    log::info!("Saved CSV: {}", path.display());
    Ok(())
}

/// Reads a data file into a table.
///
/// The extension selects the parser: `.csv` is comma-separated with a header
/// row, `.txt` is whitespace-separated with `#` comments and optional header
/// detection, and any other extension is read as one text line per row.
pub fn read_table_file(path: &Path, _config: &DataConfig) -> AppResult<DataTable> {
    let raw = std::fs::read_to_string(path).map_err(|err| RecorderError::io(path, err))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => parse_csv_text(&raw),
        Some("txt") => parse_whitespace_text(&raw),
        _ => Ok(parse_plain_lines(&raw)),
    }
}

/// Parses comma-separated text with a header row. Rows shorter than the
/// widest row are padded with missing cells.
fn parse_csv_text(raw: &str) -> AppResult<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|token| token.to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(|token| token.to_string()).collect());
    }

    let width = rows
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(headers.len());
    if width == 0 {
        return Ok(DataTable::new());
    }

    let columns = (0..width)
        .map(|index| {
            let name = headers
                .get(index)
                .filter(|token| !token.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| format!("col_{index}"));
            let tokens: Vec<Option<&str>> = rows
                .iter()
                .map(|row| row.get(index).map(String::as_str))
                .collect();
            column_from_tokens(name, &tokens)
        })
        .collect();

    DataTable::from_columns(columns)
}

/// Parses whitespace-separated text.
///
/// Blank lines and `#` comments are skipped. The first remaining line is
/// treated as a header when any of its tokens is non-numeric; header names
/// apply only when their count matches the widest data row. Every column is
/// numerically coerced, with unparseable tokens treated as missing.
fn parse_whitespace_text(raw: &str) -> AppResult<DataTable> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    if lines.is_empty() {
        return Ok(DataTable::new());
    }

    let first: Vec<&str> = lines[0].split_whitespace().collect();
    let has_header = first.iter().any(|token| token.parse::<f64>().is_err());
    let data_lines = if has_header { &lines[1..] } else { &lines[..] };

    let rows: Vec<Vec<&str>> = data_lines
        .iter()
        .map(|line| line.split_whitespace().collect())
        .collect();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Ok(DataTable::new());
    }

    let columns = (0..width)
        .map(|index| {
            let name = if has_header && first.len() == width {
                first[index].to_string()
            } else {
                format!("col_{index}")
            };
            let cells: Vec<Cell> = rows
                .iter()
                .map(|row| {
                    row.get(index)
                        .and_then(|token| parse_numeric(token))
                        .map_or(Cell::Missing, Cell::Number)
                })
                .collect();
            Column::numeric(name, cells)
        })
        .collect();

    DataTable::from_columns(columns)
}

/// Reads every line of the file into a single text column named `value`.
fn parse_plain_lines(raw: &str) -> DataTable {
    let cells: Vec<Cell> = raw
        .lines()
        .map(|line| Cell::Text(line.to_string()))
        .collect();
    DataTable {
        columns: vec![Column::text("value", cells)],
    }
}

/// Builds one typed column from raw tokens. The column is numeric when every
/// present token parses as a number; empty and absent tokens are missing.
fn column_from_tokens(name: String, tokens: &[Option<&str>]) -> Column {
    let all_numeric = tokens.iter().all(|token| match token {
        None => true,
        Some(text) if text.trim().is_empty() => true,
        Some(text) => text.trim().parse::<f64>().is_ok(),
    });

    let cells: Vec<Cell> = tokens
        .iter()
        .map(|token| match token {
            None => Cell::Missing,
            Some(text) if text.trim().is_empty() => Cell::Missing,
            Some(text) => {
                if all_numeric {
                    parse_numeric(text).map_or(Cell::Missing, Cell::Number)
                } else {
                    Cell::Text((*text).to_string())
                }
            }
        })
        .collect();

    if all_numeric {
        Column::numeric(name, cells)
    } else {
        Column::text(name, cells)
    }
}

/// Formats a value with the given number of significant digits, trimming
/// trailing zeros the way `printf`-style `%g` formatting does.
pub(crate) fn format_significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    #[allow(clippy::cast_possible_truncation)]
    let exponent = value.abs().log10().floor() as i32;
    #[allow(clippy::cast_possible_wrap)]
    let digits_i32 = digits as i32;

    if exponent < -4 || exponent >= digits_i32 {
        let formatted = format!("{value:.prec$e}", prec = digits - 1);
        trim_exponential(&formatted)
    } else {
        #[allow(clippy::cast_sign_loss)]
        let decimals = (digits_i32 - 1 - exponent).max(0) as usize;
        let formatted = format!("{value:.decimals$}");
        trim_fractional_zeros(&formatted)
    }
}

fn trim_fractional_zeros(formatted: &str) -> String {
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted.to_string()
    }
}

fn trim_exponential(formatted: &str) -> String {
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            format!("{}e{}", trim_fractional_zeros(mantissa), exponent)
        }
        None => formatted.to_string(),
    }
}
