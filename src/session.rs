//! Session lifecycle for production test runs.
//!
//! A session is rooted at a top-level data directory. Inside it, runs and
//! phases form a two-level lifecycle:
//!
//! - **Run**: one execution of a test program against one device under test.
//!   Starting a run creates the device directory hierarchy
//!   (`workstation/dut_family/dut_batch/dut_lot/dut_wafer/dut_id/`) and a
//!   timestamped run directory inside it.
//! - **Phase**: a named stage within a run, stored as an indexed subdirectory
//!   of the run directory.
//!
//! The tracker maintains a current working directory: the innermost active
//! scope (phase, then run, then the top directory) receives all dataset
//! files. Starting a run ends any previous run, and starting a phase ends
//! any previous phase, so at most one of each is ever active. Ending an
//! inactive scope is a no-op.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, RecorderError};
use crate::validation;

/// Identity of one test run: the device coordinates plus run numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// Station executing the test.
    pub workstation: String,
    /// Device family.
    pub dut_family: String,
    /// Production batch.
    pub dut_batch: String,
    /// Production lot.
    pub dut_lot: String,
    /// Wafer identifier.
    pub dut_wafer: String,
    /// Device identifier.
    pub dut_id: String,
    /// Run set number.
    pub run_set_id: u32,
    /// Run number within the set.
    pub run_id: u32,
}

impl RunIdentity {
    /// Creates a run identity from its device coordinates and numbering.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workstation: impl Into<String>,
        dut_family: impl Into<String>,
        dut_batch: impl Into<String>,
        dut_lot: impl Into<String>,
        dut_wafer: impl Into<String>,
        dut_id: impl Into<String>,
        run_set_id: u32,
        run_id: u32,
    ) -> Self {
        RunIdentity {
            workstation: workstation.into(),
            dut_family: dut_family.into(),
            dut_batch: dut_batch.into(),
            dut_lot: dut_lot.into(),
            dut_wafer: dut_wafer.into(),
            dut_id: dut_id.into(),
            run_set_id,
            run_id,
        }
    }

    /// Name of the run directory for the given start timestamp.
    pub(crate) fn directory_name(&self, timestamp: &str) -> String {
        format!(
            "{}_{}_S{}_RUN{:04}",
            self.dut_id, timestamp, self.run_set_id, self.run_id
        )
    }

    /// Path of the run directory relative to the top data directory.
    pub(crate) fn relative_dir(&self, timestamp: &str) -> PathBuf {
        self.path_components()
            .iter()
            .collect::<PathBuf>()
            .join(self.directory_name(timestamp))
    }

    /// The six identity values that become directory levels.
    pub(crate) fn path_components(&self) -> [&str; 6] {
        [
            &self.workstation,
            &self.dut_family,
            &self.dut_batch,
            &self.dut_lot,
            &self.dut_wafer,
            &self.dut_id,
        ]
    }

    /// The identity as stringified metadata fields.
    pub fn to_run_info(&self) -> RunInfo {
        RunInfo {
            workstation: self.workstation.clone(),
            dut_family: self.dut_family.clone(),
            dut_batch: self.dut_batch.clone(),
            dut_lot: self.dut_lot.clone(),
            dut_wafer: self.dut_wafer.clone(),
            dut_id: self.dut_id.clone(),
            run_set_id: self.run_set_id.to_string(),
            run_id: self.run_id.to_string(),
        }
    }
}

/// Run identity fields as they appear in dataset metadata. Numeric run
/// identifiers are stringified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Station executing the test.
    pub workstation: String,
    /// Device family.
    pub dut_family: String,
    /// Production batch.
    pub dut_batch: String,
    /// Production lot.
    pub dut_lot: String,
    /// Wafer identifier.
    pub dut_wafer: String,
    /// Device identifier.
    pub dut_id: String,
    /// Run set number.
    pub run_set_id: String,
    /// Run number within the set.
    pub run_id: String,
}

#[derive(Debug, Clone)]
struct ActiveRun {
    identity: RunIdentity,
    dir: PathBuf,
}

#[derive(Debug, Clone)]
struct ActivePhase {
    dir: PathBuf,
}

#[derive(Debug)]
enum SessionState {
    Idle,
    RunActive(ActiveRun),
    PhaseActive(ActiveRun, ActivePhase),
}

/// Tracks the active run and phase and the current output directory.
#[derive(Debug)]
pub struct SessionTracker {
    top_dir: PathBuf,
    state: SessionState,
}

impl SessionTracker {
    /// Creates a tracker rooted at `top_dir`, creating the directory if needed.
    pub fn new(top_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let top_dir = top_dir.into();
        fs::create_dir_all(&top_dir).map_err(|err| RecorderError::io(&top_dir, err))?;
        Ok(SessionTracker {
            top_dir,
            state: SessionState::Idle,
        })
    }

    /// The top-level data directory.
    pub fn top_dir(&self) -> &Path {
        &self.top_dir
    }

    /// The directory that receives dataset files right now: the active phase
    /// directory, else the active run directory, else the top directory.
    pub fn current_dir(&self) -> &Path {
        match &self.state {
            SessionState::Idle => &self.top_dir,
            SessionState::RunActive(run) => &run.dir,
            SessionState::PhaseActive(_, phase) => &phase.dir,
        }
    }

    /// True while a run is active.
    pub fn is_run_active(&self) -> bool {
        !matches!(self.state, SessionState::Idle)
    }

    /// True while a phase is active.
    pub fn is_phase_active(&self) -> bool {
        matches!(self.state, SessionState::PhaseActive(..))
    }

    /// The active run directory, if a run is active.
    pub fn run_dir(&self) -> Option<&Path> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::RunActive(run) | SessionState::PhaseActive(run, _) => {
                Some(run.dir.as_path())
            }
        }
    }

    /// The identity of the active run, if any.
    pub fn run_identity(&self) -> Option<&RunIdentity> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::RunActive(run) | SessionState::PhaseActive(run, _) => {
                Some(&run.identity)
            }
        }
    }

    /// The active run identity as metadata fields, if a run is active.
    pub fn run_info(&self) -> Option<RunInfo> {
        self.run_identity().map(RunIdentity::to_run_info)
    }

    /// Starts a new run, ending any active run first.
    ///
    /// Creates the device directory hierarchy and the timestamped run
    /// directory. Returns false (leaving the session idle) when an identity
    /// value cannot be used as a directory name or the directory cannot be
    /// created.
    pub fn start_run(&mut self, identity: RunIdentity) -> bool {
        self.end_run();

        for component in identity.path_components() {
            if let Err(err) = validation::is_path_component(component) {
                log::error!("Rejected run identity value '{component}': {err}");
                return false;
            }
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let run_dir = self.top_dir.join(identity.relative_dir(&timestamp));
        if let Err(err) = fs::create_dir_all(&run_dir) {
            log::error!("Failed to create run directory {}: {err}", run_dir.display());
            return false;
        }

        log::info!(
            "TEST_RUN_START: {} run {} at {}",
            identity.dut_id,
            identity.run_id,
            run_dir.display()
        );
        self.state = SessionState::RunActive(ActiveRun {
            identity,
            dir: run_dir,
        });
        true
    }

    /// Ends the active run, ending its active phase first. No-op when idle.
    pub fn end_run(&mut self) {
        self.end_phase();
        if matches!(self.state, SessionState::RunActive(_)) {
            log::info!("RUN_END");
            self.state = SessionState::Idle;
        }
    }

    /// Starts a new phase within the active run, ending any active phase
    /// first.
    ///
    /// Creates the `{index:04}_{name}` subdirectory of the run directory.
    /// Returns false without a run, when the name would escape the run
    /// directory, or when the directory cannot be created.
    pub fn start_phase(&mut self, index: u32, name: &str) -> bool {
        self.end_phase();
        let SessionState::RunActive(run) = &self.state else {
            log::error!("No active run. Cannot start a phase.");
            return false;
        };

        if name.chars().any(|c| matches!(c, '/' | '\\' | '\0')) {
            log::error!("Failed to create phase directory: invalid phase name '{name}'");
            return false;
        }

        let phase_dir = run.dir.join(format!("{index:04}_{name}"));
        if let Err(err) = fs::create_dir_all(&phase_dir) {
            log::error!("Failed to create phase directory: {err}");
            return false;
        }

        log::info!("PHASE_START: {index} - {name}");
        let run = run.clone();
        self.state = SessionState::PhaseActive(run, ActivePhase { dir: phase_dir });
        true
    }

    /// Ends the active phase, returning the current directory to the run
    /// directory. No-op when no phase is active.
    pub fn end_phase(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        self.state = match state {
            SessionState::PhaseActive(run, _) => {
                log::info!("PHASE_END");
                SessionState::RunActive(run)
            }
            other => other,
        };
    }
}
