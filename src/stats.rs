//! Per-column summary statistics.
//!
//! Every numeric column of a table is summarized into a [`BasicStatistics`]
//! record. Quantiles use linear interpolation between the two nearest order
//! statistics, and the standard deviation is the sample deviation. Undefined
//! values (for example the deviation of a single reading) are NaN, which
//! serializes as JSON null.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::table::{Column, DataTable};

/// Summary statistics for one numeric column.
///
/// NaN fields are written as JSON null and read back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicStatistics {
    /// Number of present values.
    pub count: f64,
    /// Arithmetic mean.
    #[serde(deserialize_with = "nan_from_null")]
    pub mean: f64,
    /// Sample standard deviation.
    #[serde(deserialize_with = "nan_from_null")]
    pub std: f64,
    /// Smallest value.
    #[serde(deserialize_with = "nan_from_null")]
    pub min: f64,
    /// 25th percentile.
    #[serde(deserialize_with = "nan_from_null")]
    pub p25: f64,
    /// Median.
    #[serde(deserialize_with = "nan_from_null")]
    pub p50: f64,
    /// 75th percentile.
    #[serde(deserialize_with = "nan_from_null")]
    pub p75: f64,
    /// Largest value.
    #[serde(deserialize_with = "nan_from_null")]
    pub max: f64,
}

fn nan_from_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.unwrap_or(f64::NAN))
}

/// Summarizes every numeric column, keyed by column name.
///
/// Text columns are skipped. A numeric column with no present values yields
/// a zero count with NaN for the remaining fields.
pub fn basic_statistics(table: &DataTable) -> BTreeMap<String, BasicStatistics> {
    table
        .columns()
        .iter()
        .filter(|column| column.is_numeric())
        .map(|column| (column.name().to_string(), describe_column(column)))
        .collect()
}

fn describe_column(column: &Column) -> BasicStatistics {
    let mut values = column.numeric_values();
    values.sort_by(f64::total_cmp);

    let count = values.len();
    if count == 0 {
        return BasicStatistics {
            count: 0.0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            p50: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        };
    }

    #[allow(clippy::cast_precision_loss)]
    let count_f = count as f64;
    let mean = values.iter().sum::<f64>() / count_f;
    let std = if count < 2 {
        f64::NAN
    } else {
        let variance = values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / (count_f - 1.0);
        variance.sqrt()
    };

    BasicStatistics {
        count: count_f,
        mean,
        std,
        min: values[0],
        p25: percentile(&values, 0.25),
        p50: percentile(&values, 0.5),
        p75: percentile(&values, 0.75),
        max: values[count - 1],
    }
}

/// Linear-interpolation percentile of sorted values.
fn percentile(values: &[f64], quantile: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    let position = quantile * (values.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = position.floor() as usize;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let upper = position.ceil() as usize;
    if lower == upper {
        values[lower]
    } else {
        #[allow(clippy::cast_precision_loss)]
        let weight = position - lower as f64;
        values[lower] * (1.0 - weight) + values[upper] * weight
    }
}
