//! Unified error type hierarchy for docbuild
//!
//! Provides structured error handling with ConfigError and BuildError.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::orchestrator::state::BuildStage;

/// Shell status for "command not found".
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Pipeline execution errors.
///
/// None of these are recovered inside the pipeline: the first one raised aborts
/// every remaining stage and becomes the process failure.
#[derive(Error, Debug)]
pub enum BuildError {
    /// No candidate site-generator executable exists on the search path.
    #[error("None of the candidate tools were found on the search path: {}", .candidates.join(", "))]
    ToolNotFound { candidates: Vec<String> },

    /// An external program returned a non-zero status (or could not be launched).
    #[error("Stage '{stage}' failed: '{program}' exited with status {code}")]
    ExternalStepFailure {
        stage: BuildStage,
        program: String,
        code: i32,
    },

    /// A copy step's source file does not exist.
    #[error("Source file missing: {}", .0.display())]
    MissingSourceFile(PathBuf),

    /// The directory the pipeline was asked to enter does not exist.
    #[error("Working directory not found: {}", .0.display())]
    WorkdirNotFound(PathBuf),

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: BuildStage, to: BuildStage },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Wrap an IO error with a short description of what was attempted.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BuildError::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit status matching this failure.
    ///
    /// External failures surface the tool's own status, a missing tool maps to
    /// the shell's 127, everything else is a plain 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::ExternalStepFailure { code, .. } => *code,
            BuildError::ToolNotFound { .. } => EXIT_COMMAND_NOT_FOUND,
            _ => 1,
        }
    }
}

/// Top-level result type for pipeline operations.
pub type Result<T> = std::result::Result<T, BuildError>;
