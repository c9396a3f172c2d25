/// System module: search-path tool resolution and working-directory context

pub mod workdir;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

pub use workdir::{WorkdirContext, WorkdirGuard};

/// Milestone logging: routed to the parsed log as well as the full one
#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        // Use target="parsed" for high-level events
        $crate::log::info!(target: "parsed", "{}", msg);
    }}
}

/// An executable picked from an ordered candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    /// Candidate name that matched
    pub name: String,

    /// Absolute path found on the search path
    pub path: PathBuf,
}

/// Probe the search path for each candidate in priority order and return the
/// first one found.
///
/// # Arguments
/// * `candidates` - Executable names, highest priority first
/// * `search_path` - `PATH`-style list to search; `None` uses the process `PATH`
/// * `cwd` - Directory relative search-path entries are resolved against
///
/// # Returns
/// `Err(BuildError::ToolNotFound)` if no candidate exists
pub fn resolve_executable(
    candidates: &[String],
    search_path: Option<&OsString>,
    cwd: &Path,
) -> Result<ResolvedTool, BuildError> {
    let path_var = search_path
        .cloned()
        .or_else(|| std::env::var_os("PATH"))
        .unwrap_or_default();

    for name in candidates {
        match which::which_in(name, Some(&path_var), cwd) {
            Ok(path) => {
                log::info!("[System] [RESOLVE] ✓ '{}' found at {}", name, path.display());
                return Ok(ResolvedTool {
                    name: name.clone(),
                    path,
                });
            }
            Err(_) => {
                log::debug!("[System] [RESOLVE] '{}' not on search path", name);
            }
        }
    }

    log::error!(
        "[System] [RESOLVE] ✗ None of [{}] found on search path",
        candidates.join(", ")
    );
    Err(BuildError::ToolNotFound {
        candidates: candidates.to_vec(),
    })
}
