//! Recorder configuration using Figment.
//!
//! This module provides strongly-typed configuration loading for the recorder.
//! Configuration is loaded from:
//! 1. config/recorder.toml file (base configuration)
//! 2. Environment variables (prefixed with BENCH_RECORDER__)
//!
//! Every field has a default, so an absent file yields a usable configuration.
//!
//! # Example
//! ```no_run
//! use bench_recorder::config::RecorderSettings;
//!
//! # fn main() -> Result<(), figment::Error> {
//! let settings = RecorderSettings::load()?;
//! println!("Numeric precision: {}", settings.data.numeric_precision);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clean::MissingPolicy;
use crate::plot::PlotConfig;
use crate::validation;

/// Top-level recorder configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecorderSettings {
    /// Table normalization and cleaning settings
    #[serde(default)]
    pub data: DataConfig,
    /// Chart rendering settings
    #[serde(default)]
    pub plot: PlotConfig,
}

/// Table normalization and cleaning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Promote text columns whose every present value parses as a number
    #[serde(default = "default_auto_detect_types")]
    pub auto_detect_types: bool,
    /// Policy applied to missing cells (drop, fill, or interpolate)
    #[serde(default)]
    pub handle_missing: MissingPolicy,
    /// Significant digits used when writing numeric CSV cells
    #[serde(default = "default_numeric_precision")]
    pub numeric_precision: usize,
    /// Text encoding for file input and output
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

// Default value functions
fn default_auto_detect_types() -> bool {
    true
}

fn default_numeric_precision() -> usize {
    6
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            auto_detect_types: default_auto_detect_types(),
            handle_missing: MissingPolicy::default(),
            numeric_precision: default_numeric_precision(),
            encoding: default_encoding(),
        }
    }
}

impl RecorderSettings {
    /// Load configuration from config/recorder.toml and environment variables
    ///
    /// Environment variables can override configuration with prefix BENCH_RECORDER__
    /// Example: BENCH_RECORDER__DATA__NUMERIC_PRECISION=4
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/recorder.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BENCH_RECORDER__").split("__"))
            .extract()
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        validation::is_supported_encoding(&self.data.encoding)
            .map_err(|err| format!("Invalid encoding '{}': {}", self.data.encoding, err))?;

        if validation::is_in_range(self.data.numeric_precision, 1..=17).is_err() {
            return Err(format!(
                "Invalid numeric_precision {}. Must be 1-17",
                self.data.numeric_precision
            ));
        }

        let (width, height) = self.plot.figsize;
        if width == 0 || height == 0 {
            return Err(format!(
                "Invalid figsize ({width}, {height}). Both dimensions must be at least 1 inch"
            ));
        }
        if width > 100 || height > 100 {
            return Err(format!(
                "Invalid figsize ({width}, {height}). Dimensions above 100 inches are rejected"
            ));
        }

        if validation::is_in_range(self.plot.dpi, 1..=1000).is_err() {
            return Err(format!("Invalid dpi {}. Must be 1-1000", self.plot.dpi));
        }

        if !self.plot.line_width.is_finite() || self.plot.line_width <= 0.0 {
            return Err(format!(
                "Invalid line_width {}. Must be a positive number",
                self.plot.line_width
            ));
        }

        if validation::is_in_range(self.plot.alpha, 0.0..=1.0).is_err() {
            return Err(format!(
                "Invalid alpha {}. Must be within 0.0-1.0",
                self.plot.alpha
            ));
        }

        Ok(())
    }
}
