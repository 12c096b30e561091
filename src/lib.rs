//! # Bench Recorder Library
//!
//! This crate is the measurement recording and reporting layer for production
//! test benches. It takes the data a test script produces, in whatever shape
//! the script happens to have it, and turns it into a self-describing dataset
//! on disk: a canonical CSV table, rendered charts, and a `metadata.json`
//! document with a frozen schema that downstream analysis tooling consumes.
//! Datasets land in a session directory tree that mirrors the production
//! hierarchy of workstation, device and run.
//!
//! ## Crate Structure
//!
//! The library is organized into several modules, each with a distinct
//! responsibility:
//!
//! - **`recorder`**: The [`recorder::Recorder`] entry point. One call records
//!   a complete dataset: validation, normalization, cleaning, CSV, charts and
//!   metadata.
//! - **`session`**: Run and phase lifecycle management and the session
//!   directory tree.
//! - **`normalize`**: Conversion of every accepted input shape into the
//!   canonical table.
//! - **`table`**: The canonical column-oriented table and its cell model.
//! - **`clean`**: Missing-value policies and numeric type promotion.
//! - **`stats`**: Summary statistics per numeric column.
//! - **`storage`**: CSV and text file reading and CSV writing.
//! - **`plot`**: Chart rendering configuration and PNG output.
//! - **`metadata`**: The dataset metadata document and its required fields.
//! - **`measurement`**: Timestamped point measurements for incremental
//!   collection.
//! - **`config`**: Recorder settings loaded from TOML files and the
//!   environment. See [`config::RecorderSettings`].
//! - **`error`**: The [`error::RecorderError`] enum for centralized error
//!   handling.
//! - **`validation`**: Utility functions for validating names, paths and
//!   numeric ranges.

pub mod clean;
pub mod config;
pub mod error;
pub mod measurement;
pub mod metadata;
pub mod normalize;
pub mod plot;
pub mod recorder;
pub mod session;
pub mod stats;
pub mod storage;
pub mod table;
pub mod validation;

pub use error::{AppResult, RecorderError};
pub use recorder::{DatasetRecord, DatasetRequest, Recorder};
