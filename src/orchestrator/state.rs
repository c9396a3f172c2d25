//! Build State Management and Stage Tracking
//!
//! This module provides the state tracking structures used by the orchestrator
//! to follow a documentation build across its stages.
//!
//! **Architecture**:
//! - `BuildStage`: Enum representing the discrete pipeline stages
//! - `OrchestrationState`: Struct tracking the current stage, per-stage records,
//!   recorded invocations and the final outcome
//! - State transitions are driven by the orchestrator and validated here

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use crate::error::BuildError;
use crate::orchestrator::executor::Invocation;

/// Build stage enumeration - discrete states in the pipeline lifecycle.
///
/// The orchestrator walks these in declaration order; any stage may also fall
/// through to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStage {
    /// Nothing has run yet
    Pending,

    /// Stage 1: Child environment and output format fixed
    Configure,

    /// Stage 2: Cache-map image generation
    GenerateCmaps,

    /// Stage 3: External dependency listing
    ListDependencies,

    /// Stage 4: Working directory moved into the documentation sources
    EnterSource,

    /// Stage 5: LaTeX compile of the cheatsheet
    CompileCheatsheet,

    /// Stage 6: Static asset directory ensured
    EnsureStaticDir,

    /// Stage 7: Cheatsheet copied to its two destinations
    CopyCheatsheet,

    /// Stage 8: Static-site generator looked up on the search path
    ResolveSiteGenerator,

    /// Stage 9: Static-site generator run
    GenerateSite,

    /// Stage 10: Working directory restored
    RestoreWorkdir,

    /// Pipeline completed successfully
    Completed,

    /// Pipeline aborted
    Failed,
}

impl BuildStage {
    /// The ten pipeline stages in execution order.
    pub const PIPELINE: [BuildStage; 10] = [
        BuildStage::Configure,
        BuildStage::GenerateCmaps,
        BuildStage::ListDependencies,
        BuildStage::EnterSource,
        BuildStage::CompileCheatsheet,
        BuildStage::EnsureStaticDir,
        BuildStage::CopyCheatsheet,
        BuildStage::ResolveSiteGenerator,
        BuildStage::GenerateSite,
        BuildStage::RestoreWorkdir,
    ];

    /// Get the human-readable name for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStage::Pending => "pending",
            BuildStage::Configure => "configure",
            BuildStage::GenerateCmaps => "generate-cmaps",
            BuildStage::ListDependencies => "list-dependencies",
            BuildStage::EnterSource => "enter-source",
            BuildStage::CompileCheatsheet => "compile-cheatsheet",
            BuildStage::EnsureStaticDir => "ensure-static-dir",
            BuildStage::CopyCheatsheet => "copy-cheatsheet",
            BuildStage::ResolveSiteGenerator => "resolve-site-generator",
            BuildStage::GenerateSite => "generate-site",
            BuildStage::RestoreWorkdir => "restore-workdir",
            BuildStage::Completed => "completed",
            BuildStage::Failed => "failed",
        }
    }

    /// The stage that follows this one on the success path.
    pub fn successor(&self) -> Option<BuildStage> {
        match self {
            BuildStage::Pending => Some(BuildStage::Configure),
            BuildStage::Configure => Some(BuildStage::GenerateCmaps),
            BuildStage::GenerateCmaps => Some(BuildStage::ListDependencies),
            BuildStage::ListDependencies => Some(BuildStage::EnterSource),
            BuildStage::EnterSource => Some(BuildStage::CompileCheatsheet),
            BuildStage::CompileCheatsheet => Some(BuildStage::EnsureStaticDir),
            BuildStage::EnsureStaticDir => Some(BuildStage::CopyCheatsheet),
            BuildStage::CopyCheatsheet => Some(BuildStage::ResolveSiteGenerator),
            BuildStage::ResolveSiteGenerator => Some(BuildStage::GenerateSite),
            BuildStage::GenerateSite => Some(BuildStage::RestoreWorkdir),
            BuildStage::RestoreWorkdir => Some(BuildStage::Completed),
            BuildStage::Completed | BuildStage::Failed => None,
        }
    }

    /// Check if a transition to the given stage is valid.
    ///
    /// Terminal stages accept nothing; there is no retry path out of `Failed`.
    pub fn can_transition_to(&self, next: BuildStage) -> bool {
        match self {
            BuildStage::Completed | BuildStage::Failed => false,
            _ => next == BuildStage::Failed || self.successor() == Some(next),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStage::Completed | BuildStage::Failed)
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single stage ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "message")]
pub enum StageOutcome {
    Succeeded,
    Failed(String),
}

/// One line of the stage log kept in the state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: BuildStage,

    /// Wall-clock start of the stage
    pub started_at: DateTime<Local>,

    pub duration_ms: u64,

    pub outcome: StageOutcome,

    /// Stage-specific note (e.g. whether a directory was created or already there)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Build execution state snapshot.
///
/// Maintained by the orchestrator and written out as the JSON build report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationState {
    /// Current stage
    pub stage: BuildStage,

    /// Completed (or failed) stages, in the order they ran
    pub records: Vec<StageRecord>,

    /// Every external program invocation, in order
    pub invocations: Vec<Invocation>,

    /// Site generator picked by the resolution stage
    pub site_generator: Option<PathBuf>,

    pub started_at: DateTime<Local>,

    pub finished_at: Option<DateTime<Local>>,

    /// Error message if the pipeline failed
    pub error: Option<String>,

    #[serde(skip)]
    stage_started: Option<(DateTime<Local>, Instant)>,
}

impl Default for OrchestrationState {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestrationState {
    pub fn new() -> Self {
        OrchestrationState {
            stage: BuildStage::Pending,
            records: Vec::new(),
            invocations: Vec::new(),
            site_generator: None,
            started_at: Local::now(),
            finished_at: None,
            error: None,
            stage_started: None,
        }
    }

    /// Attempt to transition to the next stage.
    pub fn transition_to(&mut self, next: BuildStage) -> Result<(), BuildError> {
        if !self.stage.can_transition_to(next) {
            return Err(BuildError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        if next.is_terminal() {
            self.finished_at = Some(Local::now());
            self.stage_started = None;
        } else {
            self.stage_started = Some((Local::now(), Instant::now()));
        }
        Ok(())
    }

    /// Close the current stage with a success record.
    pub fn complete_stage(&mut self, detail: Option<String>) {
        self.push_record(StageOutcome::Succeeded, detail);
    }

    /// Record an error against the current stage and mark the pipeline failed.
    pub fn record_error(&mut self, error: String) {
        if !self.stage.is_terminal() && self.stage != BuildStage::Pending {
            self.push_record(StageOutcome::Failed(error.clone()), None);
        }
        self.error = Some(error);
        self.stage = BuildStage::Failed;
        self.stage_started = None;
        self.finished_at = Some(Local::now());
    }

    pub fn record_invocation(&mut self, invocation: Invocation) {
        self.invocations.push(invocation);
    }

    /// Stages that ran to success, in order.
    pub fn completed_stages(&self) -> Vec<BuildStage> {
        self.records
            .iter()
            .filter(|r| r.outcome == StageOutcome::Succeeded)
            .map(|r| r.stage)
            .collect()
    }

    /// The stage that failed, if any.
    pub fn failed_stage(&self) -> Option<BuildStage> {
        self.records
            .iter()
            .find(|r| matches!(r.outcome, StageOutcome::Failed(_)))
            .map(|r| r.stage)
    }

    pub fn is_completed(&self) -> bool {
        self.stage == BuildStage::Completed
    }

    fn push_record(&mut self, outcome: StageOutcome, detail: Option<String>) {
        let (started_at, duration_ms) = match self.stage_started {
            Some((at, clock)) => (at, clock.elapsed().as_millis() as u64),
            None => (Local::now(), 0),
        };
        self.records.push(StageRecord {
            stage: self.stage,
            started_at,
            duration_ms,
            outcome,
            detail,
        });
    }
}
