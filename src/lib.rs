//! docbuild
//!
//! Orchestrates a documentation build: cache-map images, dependency listing,
//! a LaTeX cheatsheet PDF and a static HTML site, each produced by an external
//! tool run in a fixed order.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **config**: Configuration defaults, loading and validation
//! - **system**: Search-path tool resolution and the scoped working directory
//! - **orchestrator**: The stage pipeline, its state and the tool runner seam
//! - **log_collector**: Console + on-disk logging backend for the `log` crate
//! - **report**: JSON build report
//! - **locate**: URL of the generated documentation

// Core foundational modules
pub mod error;

pub mod config;

// System abstraction module (tool lookup, working directory)
pub mod system;

// Robust, decoupled logging system
pub mod log_collector;

// Stage pipeline and state management
pub mod orchestrator;

pub mod report;

// Where the generated documentation ends up
pub mod locate;

// Re-export the log crate for macro usage
pub use log;

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{BuildError, ConfigError, Result};

pub use config::DocBuildConfig;

pub use log_collector::{LogCollector, LogLine};

pub use system::{resolve_executable, ResolvedTool, WorkdirContext, WorkdirGuard};

pub use orchestrator::{
    BuildOrchestrator, BuildStage, Invocation, OrchestrationState, PlannedStep, SystemRunner,
    ToolRunner,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
