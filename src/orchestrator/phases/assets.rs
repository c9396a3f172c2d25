//! Asset stages: static directory creation and cheatsheet distribution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Whether the ensure step had anything to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    AlreadyPresent,
}

/// Make sure `dir` exists as a directory, creating it if absent.
///
/// Running it again on the same path is a no-op.
pub fn ensure_dir(dir: &Path) -> Result<EnsureOutcome, BuildError> {
    if dir.is_dir() {
        log::info!("[Build] [ASSETS] {} already present", dir.display());
        return Ok(EnsureOutcome::AlreadyPresent);
    }

    fs::create_dir_all(dir)
        .map_err(|e| BuildError::io(format!("Failed to create {}", dir.display()), e))?;
    log::info!("[Build] [ASSETS] ✓ Created {}", dir.display());
    Ok(EnsureOutcome::Created)
}

/// Copy `source` to every path in `destinations`, overwriting existing files.
///
/// Missing parent directories of a destination are created. Returns the
/// destination paths written, in order.
///
/// # Errors
/// `BuildError::MissingSourceFile` before anything is written if `source` does
/// not exist.
pub fn copy_artifact(source: &Path, destinations: &[PathBuf]) -> Result<Vec<PathBuf>, BuildError> {
    if !source.is_file() {
        log::error!("[Build] [ASSETS] ✗ Source file missing: {}", source.display());
        return Err(BuildError::MissingSourceFile(source.to_path_buf()));
    }

    let mut written = Vec::with_capacity(destinations.len());
    for dest in destinations {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                fs::create_dir_all(parent).map_err(|e| {
                    BuildError::io(format!("Failed to create {}", parent.display()), e)
                })?;
            }
        }

        fs::copy(source, dest).map_err(|e| {
            BuildError::io(
                format!("Failed to copy {} to {}", source.display(), dest.display()),
                e,
            )
        })?;
        log::info!(
            "[Build] [ASSETS] ✓ Copied {} -> {}",
            source.display(),
            dest.display()
        );
        written.push(dest.clone());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = tempdir().expect("Failed to create temp dir");
        let dir = temp.path().join("_static");

        assert_eq!(ensure_dir(&dir).unwrap(), EnsureOutcome::Created);
        assert_eq!(ensure_dir(&dir).unwrap(), EnsureOutcome::AlreadyPresent);

        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_ensure_dir_fails_on_file() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("_static");
        fs::write(&path, b"not a dir").unwrap();

        assert!(matches!(ensure_dir(&path), Err(BuildError::Io { .. })));
    }

    #[test]
    fn test_copy_overwrites_and_creates_parents() {
        let temp = tempdir().expect("Failed to create temp dir");
        let source = temp.path().join("cheatsheet.pdf");
        fs::write(&source, b"%PDF-new").unwrap();

        let existing = temp.path().join("_static/cheatsheet.pdf");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, b"%PDF-old").unwrap();
        let fresh = temp.path().join("html/_downloads/cheatsheet.pdf");

        let written = copy_artifact(&source, &[existing.clone(), fresh.clone()]).unwrap();
        assert_eq!(written, vec![existing.clone(), fresh.clone()]);
        assert_eq!(fs::read(&existing).unwrap(), b"%PDF-new");
        assert_eq!(fs::read(&fresh).unwrap(), b"%PDF-new");
    }

    #[test]
    fn test_copy_missing_source_writes_nothing() {
        let temp = tempdir().expect("Failed to create temp dir");
        let dest = temp.path().join("_static/cheatsheet.pdf");

        let err = copy_artifact(&temp.path().join("cheatsheet.pdf"), &[dest.clone()]).unwrap_err();
        assert!(matches!(err, BuildError::MissingSourceFile(_)));
        assert!(!dest.exists());
        assert!(!temp.path().join("_static").exists());
    }
}
