//! Custom error types for the recorder.
//!
//! This module defines the primary error type, `RecorderError`, for the entire
//! crate. Using the `thiserror` crate, it provides a centralized and consistent
//! way to handle the different kinds of errors that can occur while recording a
//! dataset, from I/O and configuration issues to chart rendering problems.
//!
//! ## Error Hierarchy
//!
//! `RecorderError` is an enum that consolidates various error sources:
//!
//! - **`Config`**: Wraps errors from the `figment` crate, typically related to
//!   file parsing or format issues in the configuration files.
//! - **`Configuration`**: Represents semantic errors in the configuration, such
//!   as values that parse but are logically invalid (e.g., an unsupported text
//!   encoding). These are caught during the validation step.
//! - **`Validation`**: Raised when a dataset request is malformed, for example
//!   a required metadata field is missing or a selected column does not exist.
//!   Validation failures are reported before any file is written.
//! - **`Io`**: Wraps `std::io::Error` together with the path that failed, so
//!   filesystem failures name the file involved.
//! - **`Csv`** / **`Serialize`**: Wrap errors from the `csv` and `serde_json`
//!   crates raised while writing the canonical table and its metadata document.
//! - **`Render`**: Chart rendering failures, stringified at the drawing
//!   backend boundary.
//!
//! By using `#[from]`, `RecorderError` can be seamlessly created from the
//! underlying error types, simplifying error handling throughout the crate
//! with the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AppResult<T> = std::result::Result<T, RecorderError>;

/// Unified error type for every fallible recorder operation.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Chart rendering error: {0}")]
    Render(String),
}

impl RecorderError {
    /// Builds an I/O error tagged with the path that failed.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecorderError::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a validation error from any printable message.
    pub fn validation(message: impl Into<String>) -> Self {
        RecorderError::Validation(message.into())
    }
}
