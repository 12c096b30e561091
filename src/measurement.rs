//! Timestamped point measurements.
//!
//! A [`Measurement`] is one instrument reading: a capture time plus named
//! field values. Measurements convert directly into dataset input, where each
//! measurement becomes one table row with a trailing `timestamp` column in
//! RFC 3339 format.

use chrono::{DateTime, Utc};

use crate::normalize::DataInput;
use crate::table::Cell;

/// One timestamped reading with named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    timestamp: DateTime<Utc>,
    fields: Vec<(String, Cell)>,
}

impl Measurement {
    /// Creates an empty measurement captured now.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Creates an empty measurement captured at `timestamp`.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Measurement {
            timestamp,
            fields: Vec::new(),
        }
    }

    /// Adds a field, keeping insertion order.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// The capture time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The fields in insertion order.
    pub fn fields(&self) -> &[(String, Cell)] {
        &self.fields
    }

    fn into_record(self) -> Vec<(String, Cell)> {
        let mut record = self.fields;
        record.push((
            "timestamp".to_string(),
            Cell::Text(self.timestamp.to_rfc3339()),
        ));
        record
    }
}

impl Default for Measurement {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Measurement> for DataInput {
    fn from(measurement: Measurement) -> Self {
        DataInput::Records(vec![measurement.into_record()])
    }
}

impl From<Vec<Measurement>> for DataInput {
    fn from(measurements: Vec<Measurement>) -> Self {
        DataInput::Records(
            measurements
                .into_iter()
                .map(Measurement::into_record)
                .collect(),
        )
    }
}
