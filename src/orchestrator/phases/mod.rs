//! Orchestrator phases: filesystem stages of the documentation pipeline.
//!
//! External-tool stages go through the executor; the stages here only touch
//! the filesystem and are independently testable.

pub mod assets;

pub use assets::{copy_artifact, ensure_dir, EnsureOutcome};
