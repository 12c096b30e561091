//! The dataset recorder: one call records a complete dataset.
//!
//! [`Recorder`] owns the session lifecycle and the recording pipeline. A
//! [`DatasetRequest`] carries the data plus its descriptive fields; recording
//! validates the request, normalizes and cleans the data, then writes the
//! CSV table, the charts and the metadata document into the current session
//! directory. Validation runs before anything touches the filesystem, so a
//! rejected request leaves no files behind.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::clean::clean;
use crate::config::RecorderSettings;
use crate::error::{AppResult, RecorderError};
use crate::metadata::{DatasetMetadata, EnvironmentInfo, FieldMap, PlotFileEntry, TestInfo};
use crate::normalize::{normalize, DataInput};
use crate::plot::{self, PlotConfig};
use crate::session::{RunIdentity, SessionTracker};
use crate::stats;
use crate::storage;
use crate::table::{Column, DataTable};
use crate::validation;

/// Selects a table column by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Zero-based column position.
    Index(usize),
    /// Column name.
    Name(String),
}

impl From<usize> for ColumnSelector {
    fn from(index: usize) -> Self {
        ColumnSelector::Index(index)
    }
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        ColumnSelector::Name(name.to_string())
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        ColumnSelector::Name(name)
    }
}

/// Everything needed to record one dataset.
#[derive(Debug, Clone)]
pub struct DatasetRequest {
    pub(crate) name: String,
    pub(crate) data: DataInput,
    pub(crate) test_info: TestInfo,
    pub(crate) environment_info: EnvironmentInfo,
    pub(crate) column_names: Option<Vec<String>>,
    pub(crate) headers: Option<Vec<String>>,
    pub(crate) testing_variable: Option<ColumnSelector>,
    pub(crate) dependent_variables: Option<Vec<ColumnSelector>>,
    pub(crate) plot_config: Option<PlotConfig>,
    pub(crate) parameters: FieldMap,
    pub(crate) equipment_ids: Option<String>,
    pub(crate) dut_fab: Option<String>,
    pub(crate) dut_subchip_id: Option<String>,
    pub(crate) dut_subcomponent_id: Option<String>,
    pub(crate) script_version: Option<String>,
    pub(crate) comments: Option<String>,
}

impl DatasetRequest {
    /// Creates a request from the dataset name, its data and the required
    /// descriptive blocks.
    pub fn new(
        name: impl Into<String>,
        data: impl Into<DataInput>,
        test_info: TestInfo,
        environment_info: EnvironmentInfo,
    ) -> Self {
        DatasetRequest {
            name: name.into(),
            data: data.into(),
            test_info,
            environment_info,
            column_names: None,
            headers: None,
            testing_variable: None,
            dependent_variables: None,
            plot_config: None,
            parameters: FieldMap::new(),
            equipment_ids: None,
            dut_fab: None,
            dut_subchip_id: None,
            dut_subcomponent_id: None,
            script_version: None,
            comments: None,
        }
    }

    /// Renames the normalized columns. The list must match the column count.
    pub fn with_column_names(mut self, names: Vec<String>) -> Self {
        self.column_names = Some(names);
        self
    }

    /// Names the columns of headerless input shapes (matrices and bare rows).
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Selects the independent column. Defaults to the first column.
    pub fn with_testing_variable(mut self, selector: impl Into<ColumnSelector>) -> Self {
        self.testing_variable = Some(selector.into());
        self
    }

    /// Selects the dependent columns. Defaults to every non-independent
    /// column.
    pub fn with_dependent_variables(
        mut self,
        selectors: Vec<ColumnSelector>,
    ) -> Self {
        self.dependent_variables = Some(selectors);
        self
    }

    /// Overrides the chart configuration for this dataset.
    pub fn with_plot_config(mut self, config: PlotConfig) -> Self {
        self.plot_config = Some(config);
        self
    }

    /// Replaces the caller parameters recorded in the metadata document.
    pub fn with_parameters(mut self, parameters: FieldMap) -> Self {
        self.parameters = parameters;
        self
    }

    /// Adds one caller parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Records the equipment used.
    pub fn with_equipment_ids(mut self, equipment_ids: impl Into<String>) -> Self {
        self.equipment_ids = Some(equipment_ids.into());
        self
    }

    /// Records the fabrication plant.
    pub fn with_dut_fab(mut self, dut_fab: impl Into<String>) -> Self {
        self.dut_fab = Some(dut_fab.into());
        self
    }

    /// Records the sub-chip identifier.
    pub fn with_dut_subchip_id(mut self, dut_subchip_id: impl Into<String>) -> Self {
        self.dut_subchip_id = Some(dut_subchip_id.into());
        self
    }

    /// Records the sub-component identifier.
    pub fn with_dut_subcomponent_id(mut self, dut_subcomponent_id: impl Into<String>) -> Self {
        self.dut_subcomponent_id = Some(dut_subcomponent_id.into());
        self
    }

    /// Records the producing script version.
    pub fn with_script_version(mut self, script_version: impl Into<String>) -> Self {
        self.script_version = Some(script_version.into());
        self
    }

    /// Attaches free-form comments.
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }
}

/// Everything produced by recording one dataset.
#[derive(Debug, Clone)]
pub struct DatasetRecord {
    /// The cleaned table that was written.
    pub table: DataTable,
    /// Path of the CSV file.
    pub table_path: PathBuf,
    /// Entries for the rendered charts.
    pub plot_files: Vec<PlotFileEntry>,
    /// Path of the metadata document.
    pub metadata_path: PathBuf,
    /// The metadata document as written.
    pub metadata: DatasetMetadata,
}

/// Records datasets into a session directory tree.
#[derive(Debug)]
pub struct Recorder {
    session: SessionTracker,
    settings: RecorderSettings,
}

impl Recorder {
    /// Creates a recorder rooted at `top_dir` with default settings.
    pub fn create(top_dir: impl Into<PathBuf>) -> AppResult<Self> {
        Self::with_settings(top_dir, RecorderSettings::default())
    }

    /// Creates a recorder rooted at `top_dir` with the given settings.
    /// Settings are validated up front.
    pub fn with_settings(top_dir: impl Into<PathBuf>, settings: RecorderSettings) -> AppResult<Self> {
        settings
            .validate()
            .map_err(RecorderError::Configuration)?;
        Ok(Recorder {
            session: SessionTracker::new(top_dir)?,
            settings,
        })
    }

    /// The session tracker.
    pub fn session(&self) -> &SessionTracker {
        &self.session
    }

    /// The active settings.
    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// The directory that receives dataset files right now.
    pub fn current_dir(&self) -> &Path {
        self.session.current_dir()
    }

    /// Starts a new run. See [`SessionTracker::start_run`].
    pub fn start_run(&mut self, identity: RunIdentity) -> bool {
        self.session.start_run(identity)
    }

    /// Ends the active run. See [`SessionTracker::end_run`].
    pub fn end_run(&mut self) {
        self.session.end_run();
    }

    /// Starts a new phase. See [`SessionTracker::start_phase`].
    pub fn start_phase(&mut self, index: u32, name: &str) -> bool {
        self.session.start_phase(index, name)
    }

    /// Ends the active phase. See [`SessionTracker::end_phase`].
    pub fn end_phase(&mut self) {
        self.session.end_phase();
    }

    /// Records a complete dataset, logging and swallowing any failure.
    ///
    /// This is the bench-script entry point: a failed dataset must not abort
    /// the surrounding test program. Returns `None` after logging the error.
    pub fn record_complete_dataset(&self, request: DatasetRequest) -> Option<DatasetRecord> {
        let name = request.name.clone();
        match self.try_record_complete_dataset(request) {
            Ok(record) => Some(record),
            Err(err) => {
                log::error!("Failed to record dataset \"{name}\": {err}");
                None
            }
        }
    }

    /// Records a complete dataset, returning the failure to the caller.
    ///
    /// The pipeline validates the request, normalizes the data into the
    /// canonical table, applies the renaming and cleaning steps, resolves
    /// the column selectors, and only then writes the CSV file, the charts
    /// and the metadata document. Any validation failure is reported before
    /// a single file is created.
    pub fn try_record_complete_dataset(
        &self,
        request: DatasetRequest,
    ) -> AppResult<DatasetRecord> {
        validation::is_not_empty(&request.name)
            .map_err(|_| RecorderError::validation("Dataset name must not be empty"))?;
        request.test_info.validate()?;
        request.environment_info.validate()?;

        let plot_config = request
            .plot_config
            .clone()
            .unwrap_or_else(|| self.settings.plot.clone());
        let effective = RecorderSettings {
            data: self.settings.data.clone(),
            plot: plot_config.clone(),
        };
        effective.validate().map_err(RecorderError::Configuration)?;

        let mut table = normalize(request.data, request.headers.as_deref(), &self.settings.data)?;
        if let Some(names) = &request.column_names {
            table.rename_columns(names)?;
        }
        let table = clean(table, &self.settings.data);

        let mut x_col: Option<String> = None;
        let mut y_cols: Vec<String> = Vec::new();
        if !table.is_empty() {
            let x_name = match &request.testing_variable {
                Some(selector) => resolve_column(&table, selector, "Testing variable")?,
                None => table.column_names()[0].to_string(),
            };
            y_cols = match &request.dependent_variables {
                Some(selectors) => selectors
                    .iter()
                    .map(|selector| resolve_column(&table, selector, "Dependent variable"))
                    .collect::<AppResult<Vec<String>>>()?,
                None => table
                    .column_names()
                    .into_iter()
                    .filter(|name| *name != x_name)
                    .map(String::from)
                    .collect(),
            };
            x_col = Some(x_name);
        }

        let output_dir = self.session.current_dir().to_path_buf();
        let csv_path = output_dir.join(format!("{}.csv", request.name));
        storage::write_table_csv(&table, &csv_path, &self.settings.data)?;

        let plot_files = match &x_col {
            Some(x_name) => self.render_dataset_charts(
                &table,
                &request.name,
                x_name,
                &y_cols,
                &plot_config,
                &output_dir,
            ),
            None => Vec::new(),
        };

        let metadata = DatasetMetadata {
            test_location: request.test_info.require("test_location")?.clone(),
            test_user: request.test_info.require("test_user")?.clone(),
            test_name: request.test_info.require("test_name")?.clone(),
            run_info: self.session.run_info(),
            dut_fab: request.dut_fab,
            dut_subchip_id: request.dut_subchip_id,
            dut_subcomponent_id: request.dut_subcomponent_id,
            equipment_ids: request.equipment_ids,
            testing_variable_ids: x_col,
            dependent_variable_ids: if y_cols.is_empty() {
                None
            } else {
                Some(y_cols.join(", "))
            },
            environment_temp: request.environment_info.require("environment_temp")?.clone(),
            environment_humidity: request
                .environment_info
                .require("environment_humidity")?
                .clone(),
            script_version: request.script_version,
            comments: request.comments,
            timestamp_generated_utc: Utc::now().to_rfc3339(),
            data_preview: table.head(5),
            basic_statistics: stats::basic_statistics(&table),
            csv_relative_path: self.relative_path(&csv_path),
            plot_files: plot_files.clone(),
            sql_table_name: None,
            sql_relative_path: None,
            nd_data_tables: Vec::new(),
            parameters: request.parameters,
        };

        let metadata_path = output_dir.join("metadata.json");
        metadata.save(&metadata_path)?;

        Ok(DatasetRecord {
            table,
            table_path: csv_path,
            plot_files,
            metadata_path,
            metadata,
        })
    }

    /// Renders a standalone chart into the current directory.
    ///
    /// `x_data` and `y_data` are paired by position. Falls back to the
    /// active chart configuration when none is given. Returns the file path
    /// on success, or `None` after logging the failure.
    #[allow(clippy::too_many_arguments)]
    pub fn create_plot(
        &self,
        name: &str,
        x_data: &[f64],
        y_data: &[f64],
        title: &str,
        x_label: &str,
        y_label: &str,
        config: Option<&PlotConfig>,
    ) -> Option<PathBuf> {
        let config = config.unwrap_or(&self.settings.plot);
        let points: Vec<(f64, f64)> = x_data
            .iter()
            .copied()
            .zip(y_data.iter().copied())
            .collect();
        let title = if title.is_empty() { "Data Plot" } else { title };
        let path = self.session.current_dir().join(format!("{name}.png"));

        match plot::render_plot(&path, &points, title, x_label, y_label, config) {
            Ok(()) => {
                log::info!("Saved plot: {}", path.display());
                Some(path)
            }
            Err(err) => {
                log::error!("Failed to create plot: {err}");
                None
            }
        }
    }

    /// Renders one chart per dependent column against the independent
    /// column. Non-numeric columns are skipped with an error log; a failed
    /// render skips that chart without aborting the dataset.
    fn render_dataset_charts(
        &self,
        table: &DataTable,
        dataset_name: &str,
        x_name: &str,
        y_names: &[String],
        config: &PlotConfig,
        output_dir: &Path,
    ) -> Vec<PlotFileEntry> {
        let Some(x_column) = table.column(x_name) else {
            return Vec::new();
        };
        if !x_column.is_numeric() {
            log::error!("Testing variable '{x_name}' is not numeric; skipping charts");
            return Vec::new();
        }

        let mut entries = Vec::new();
        for y_name in y_names {
            let Some(y_column) = table.column(y_name) else {
                continue;
            };
            if !y_column.is_numeric() {
                log::error!("Failed to create plot: dependent column '{y_name}' is not numeric");
                continue;
            }

            let points = paired_points(x_column, y_column);
            let plot_name = format!("{dataset_name}_{x_name}_vs_{y_name}");
            let path = output_dir.join(format!("{plot_name}.png"));
            let title = format!("{y_name} vs {x_name}");

            match plot::render_plot(&path, &points, &title, x_name, y_name, config) {
                Ok(()) => {
                    log::info!("Saved plot: {}", path.display());
                    entries.push(PlotFileEntry::image_png(
                        &plot_name,
                        self.relative_path(&path),
                    ));
                }
                Err(err) => log::error!("Failed to create plot: {err}"),
            }
        }
        entries
    }

    /// Path relative to the top data directory with `/` separators, or the
    /// absolute path when outside the tree.
    fn relative_path(&self, path: &Path) -> String {
        match path.strip_prefix(self.session.top_dir()) {
            Ok(relative) => relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.display().to_string(),
        }
    }
}

/// Resolves a selector against the table, yielding the column name.
fn resolve_column(
    table: &DataTable,
    selector: &ColumnSelector,
    role: &str,
) -> AppResult<String> {
    match selector {
        ColumnSelector::Index(index) => table
            .column_at(*index)
            .map(|column| column.name().to_string())
            .ok_or_else(|| {
                RecorderError::validation(format!(
                    "{role} index {index} is out of range for {} columns",
                    table.column_count()
                ))
            }),
        ColumnSelector::Name(name) => {
            if table.column(name).is_some() {
                Ok(name.clone())
            } else {
                Err(RecorderError::validation(format!(
                    "{role} '{name}' not found in table columns"
                )))
            }
        }
    }
}

/// Positionally paired numeric values; rows missing either side are skipped.
fn paired_points(x_column: &Column, y_column: &Column) -> Vec<(f64, f64)> {
    x_column
        .cells()
        .iter()
        .zip(y_column.cells())
        .filter_map(|(x, y)| match (x.as_number(), y.as_number()) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect()
}
