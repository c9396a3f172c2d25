//! JSON build report: the final orchestration state written to disk.

use std::fs;
use std::path::Path;

use crate::error::BuildError;
use crate::orchestrator::OrchestrationState;

/// Write `state` as pretty JSON to `path`, creating parent directories.
pub fn save_report(state: &OrchestrationState, path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| BuildError::io(format!("Failed to create {}", parent.display()), e))?;
        }
    }

    let json = serde_json::to_string_pretty(state).map_err(|e| {
        BuildError::io("Failed to serialize build report", std::io::Error::other(e))
    })?;
    fs::write(path, json)
        .map_err(|e| BuildError::io(format!("Failed to write {}", path.display()), e))?;

    log::info!("[Report] Build report written to {}", path.display());
    Ok(())
}

/// Read a report previously written by [`save_report`].
pub fn load_report(path: &Path) -> Result<OrchestrationState, BuildError> {
    let content = fs::read_to_string(path)
        .map_err(|e| BuildError::io(format!("Failed to read {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|e| {
        BuildError::io(
            format!("Invalid build report {}", path.display()),
            std::io::Error::other(e),
        )
    })
}
