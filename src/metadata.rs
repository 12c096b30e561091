//! Dataset metadata structures and the sidecar document.
//!
//! Every recorded dataset is described by a `metadata.json` document whose
//! field set and order are consumed by downstream analysis tooling and must
//! not drift. [`DatasetMetadata`] declares that document: fields serialize in
//! declaration order, absent optional values serialize as JSON null, and the
//! run identity block is flattened in when a run is active and omitted
//! entirely otherwise.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppResult, RecorderError};
use crate::session::RunInfo;
use crate::stats::BasicStatistics;

/// Free-form metadata fields keyed by name.
pub type FieldMap = BTreeMap<String, Value>;

/// Descriptive fields for the test that produced a dataset.
///
/// Arbitrary fields may be attached; `test_name`, `test_location` and
/// `test_user` are required before a dataset can be recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestInfo {
    fields: FieldMap,
}

impl TestInfo {
    /// Fields that must be present before recording.
    pub const REQUIRED_FIELDS: &'static [&'static str] =
        &["test_name", "test_location", "test_user"];

    /// Creates test info with the three required fields set.
    pub fn new(
        test_name: impl Into<String>,
        test_location: impl Into<String>,
        test_user: impl Into<String>,
    ) -> Self {
        let mut fields = FieldMap::new();
        fields.insert("test_name".to_string(), Value::String(test_name.into()));
        fields.insert(
            "test_location".to_string(),
            Value::String(test_location.into()),
        );
        fields.insert("test_user".to_string(), Value::String(test_user.into()));
        TestInfo { fields }
    }

    /// Creates test info from pre-built fields, without validating them.
    pub fn from_fields(fields: FieldMap) -> Self {
        TestInfo { fields }
    }

    /// Attaches an additional field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Reads a field, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Checks that every required field is present.
    pub fn validate(&self) -> AppResult<()> {
        for field in Self::REQUIRED_FIELDS {
            self.require(field)?;
        }
        Ok(())
    }

    pub(crate) fn require(&self, field: &str) -> AppResult<&Value> {
        self.fields.get(field).ok_or_else(|| {
            RecorderError::validation(format!("Required test_info field '{field}' is missing"))
        })
    }
}

/// Environmental conditions measured while the dataset was recorded.
///
/// `environment_temp` and `environment_humidity` are required before a
/// dataset can be recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    fields: FieldMap,
}

impl EnvironmentInfo {
    /// Fields that must be present before recording.
    pub const REQUIRED_FIELDS: &'static [&'static str] =
        &["environment_temp", "environment_humidity"];

    /// Creates environment info with the two required readings set.
    pub fn new(temperature: f64, humidity: f64) -> Self {
        let mut fields = FieldMap::new();
        fields.insert(
            "environment_temp".to_string(),
            Value::from(temperature),
        );
        fields.insert("environment_humidity".to_string(), Value::from(humidity));
        EnvironmentInfo { fields }
    }

    /// Creates environment info from pre-built fields, without validating
    /// them.
    pub fn from_fields(fields: FieldMap) -> Self {
        EnvironmentInfo { fields }
    }

    /// Attaches an additional field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Reads a field, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Checks that every required field is present.
    pub fn validate(&self) -> AppResult<()> {
        for field in Self::REQUIRED_FIELDS {
            self.require(field)?;
        }
        Ok(())
    }

    pub(crate) fn require(&self, field: &str) -> AppResult<&Value> {
        self.fields.get(field).ok_or_else(|| {
            RecorderError::validation(format!(
                "Required environment_info field '{field}' is missing"
            ))
        })
    }
}

/// One rendered chart referenced from the metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotFileEntry {
    /// File name of the image.
    pub filename: String,
    /// Path relative to the top data directory.
    pub relative_path: String,
    /// Media type tag; always `image_png`.
    pub r#type: String,
    /// Display name: the plot name with underscores as spaces.
    pub tab_name: String,
}

impl PlotFileEntry {
    /// Builds the entry for a rendered PNG chart.
    pub fn image_png(plot_name: &str, relative_path: String) -> Self {
        PlotFileEntry {
            filename: format!("{plot_name}.png"),
            relative_path,
            r#type: "image_png".to_string(),
            tab_name: plot_name.replace('_', " "),
        }
    }
}

/// The dataset metadata document.
///
/// Serialized field order is the document schema; do not reorder fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Where the test ran.
    pub test_location: Value,
    /// Who ran the test.
    pub test_user: Value,
    /// Name of the test.
    pub test_name: Value,
    /// Active run identity; omitted entirely when no run is active.
    #[serde(flatten)]
    pub run_info: Option<RunInfo>,
    /// Fabrication plant of the device.
    pub dut_fab: Option<String>,
    /// Sub-chip identifier.
    pub dut_subchip_id: Option<String>,
    /// Sub-component identifier.
    pub dut_subcomponent_id: Option<String>,
    /// Equipment used, as a free-form list.
    pub equipment_ids: Option<String>,
    /// Name of the independent column, when one was selected.
    pub testing_variable_ids: Option<String>,
    /// Names of the dependent columns, comma separated.
    pub dependent_variable_ids: Option<String>,
    /// Ambient temperature reading.
    pub environment_temp: Value,
    /// Ambient humidity reading.
    pub environment_humidity: Value,
    /// Version of the producing test script.
    pub script_version: Option<String>,
    /// Free-form comments.
    pub comments: Option<String>,
    /// Document creation time, RFC 3339 in UTC.
    pub timestamp_generated_utc: String,
    /// First rows of the recorded table.
    pub data_preview: Vec<serde_json::Map<String, Value>>,
    /// Summary statistics per numeric column.
    pub basic_statistics: BTreeMap<String, BasicStatistics>,
    /// CSV file path relative to the top data directory.
    pub csv_relative_path: String,
    /// Rendered charts.
    pub plot_files: Vec<PlotFileEntry>,
    /// Reserved for database export.
    pub sql_table_name: Option<String>,
    /// Reserved for database export.
    pub sql_relative_path: Option<String>,
    /// Reserved for multi-dimensional tables.
    pub nd_data_tables: Vec<Value>,
    /// Caller-supplied parameters.
    pub parameters: FieldMap,
}

impl DatasetMetadata {
    /// Writes the document to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|err| RecorderError::io(path, err))?;
        log::info!("Saved metadata: {}", path.display());
        Ok(())
    }

    /// Reads a document back from `path`.
    pub fn load(path: &Path) -> AppResult<Self> {
        let json = fs::read_to_string(path).map_err(|err| RecorderError::io(path, err))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RunIdentity;
    use tempfile::tempdir;

    fn sample_metadata(run_info: Option<RunInfo>) -> DatasetMetadata {
        DatasetMetadata {
            test_location: Value::String("fab2".into()),
            test_user: Value::String("operator".into()),
            test_name: Value::String("iv_sweep".into()),
            run_info,
            dut_fab: None,
            dut_subchip_id: Some("SC-3".into()),
            dut_subcomponent_id: None,
            equipment_ids: Some("SMU-01".into()),
            testing_variable_ids: Some("voltage".into()),
            dependent_variable_ids: Some("current".into()),
            environment_temp: Value::from(23.5),
            environment_humidity: Value::from(41.0),
            script_version: None,
            comments: None,
            timestamp_generated_utc: "2025-05-01T12:00:00+00:00".into(),
            data_preview: Vec::new(),
            basic_statistics: BTreeMap::new(),
            csv_relative_path: "run/iv_sweep.csv".into(),
            plot_files: Vec::new(),
            sql_table_name: None,
            sql_relative_path: None,
            nd_data_tables: Vec::new(),
            parameters: FieldMap::new(),
        }
    }

    #[test]
    fn required_test_fields_are_enforced() {
        let info = TestInfo::new("iv_sweep", "fab2", "operator");
        assert!(info.validate().is_ok());

        let mut fields = FieldMap::new();
        fields.insert("test_name".to_string(), Value::String("iv".into()));
        let incomplete = TestInfo::from_fields(fields);
        let err = incomplete.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("Required test_info field 'test_location' is missing"));
    }

    #[test]
    fn required_environment_fields_are_enforced() {
        assert!(EnvironmentInfo::new(23.5, 41.0).validate().is_ok());

        let mut fields = FieldMap::new();
        fields.insert("environment_temp".to_string(), Value::from(23.5));
        let incomplete = EnvironmentInfo::from_fields(fields);
        let err = incomplete.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("Required environment_info field 'environment_humidity' is missing"));
    }

    #[test]
    fn plot_entry_derives_names_from_the_plot_name() {
        let entry = PlotFileEntry::image_png(
            "iv_sweep_voltage_vs_current",
            "run/iv_sweep_voltage_vs_current.png".to_string(),
        );
        assert_eq!(entry.filename, "iv_sweep_voltage_vs_current.png");
        assert_eq!(entry.r#type, "image_png");
        assert_eq!(entry.tab_name, "iv sweep voltage vs current");
    }

    #[test]
    fn serialized_field_order_is_stable() {
        let run_info = RunIdentity::new("WS1", "fam", "b", "l", "w", "D-01", 1, 2).to_run_info();
        let json = serde_json::to_string_pretty(&sample_metadata(Some(run_info))).unwrap();

        let ordered_keys = [
            "\"test_location\"",
            "\"test_user\"",
            "\"test_name\"",
            "\"workstation\"",
            "\"dut_id\"",
            "\"run_id\"",
            "\"dut_fab\"",
            "\"equipment_ids\"",
            "\"testing_variable_ids\"",
            "\"dependent_variable_ids\"",
            "\"environment_temp\"",
            "\"environment_humidity\"",
            "\"timestamp_generated_utc\"",
            "\"data_preview\"",
            "\"basic_statistics\"",
            "\"csv_relative_path\"",
            "\"plot_files\"",
            "\"sql_table_name\"",
            "\"nd_data_tables\"",
            "\"parameters\"",
        ];
        let positions: Vec<usize> = ordered_keys
            .iter()
            .map(|key| json.find(key).unwrap_or_else(|| panic!("missing {key}")))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn absent_optionals_serialize_as_null_but_run_info_is_omitted() {
        let json = serde_json::to_value(sample_metadata(None)).unwrap();
        assert_eq!(json["dut_fab"], Value::Null);
        assert_eq!(json["sql_table_name"], Value::Null);
        assert!(json.get("workstation").is_none());
        assert!(json.get("run_id").is_none());
    }

    #[test]
    fn run_info_round_trips_through_the_document() {
        let run_info = RunIdentity::new("WS1", "fam", "b", "l", "w", "D-01", 1, 2).to_run_info();
        let dir = tempdir().unwrap();
        let path = dir.path().join("metadata.json");

        sample_metadata(Some(run_info.clone())).save(&path).unwrap();
        let loaded = DatasetMetadata::load(&path).unwrap();
        assert_eq!(loaded.run_info, Some(run_info));
        assert_eq!(loaded.csv_relative_path, "run/iv_sweep.csv");

        sample_metadata(None).save(&path).unwrap();
        let loaded = DatasetMetadata::load(&path).unwrap();
        assert_eq!(loaded.run_info, None);
    }
}
