//! Scoped working-directory context.
//!
//! The pipeline never touches the process-global current directory. Instead it
//! carries a [`WorkdirContext`] whose top entry is handed to every child process.
//! Entering a directory returns a [`WorkdirGuard`]; dropping the guard pops back
//! to the previous directory, whichever way the enclosing scope is left.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Stack of directories, bottom entry being the directory the build started in.
#[derive(Debug, Clone)]
pub struct WorkdirContext {
    stack: Vec<PathBuf>,
}

impl WorkdirContext {
    /// Start a context rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WorkdirContext {
            stack: vec![root.into()],
        }
    }

    /// Directory external steps currently run in.
    pub fn current(&self) -> &Path {
        // The root entry is never popped
        self.stack.last().map(PathBuf::as_path).unwrap_or_else(|| Path::new("."))
    }

    /// Directory the context was created with.
    pub fn root(&self) -> &Path {
        self.stack.first().map(PathBuf::as_path).unwrap_or_else(|| Path::new("."))
    }

    /// Number of entries, 1 when nothing has been entered.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Resolve `path` against the current directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current().join(path)
    }

    /// Enter `dir` (relative to the current directory, or absolute).
    ///
    /// # Errors
    /// `BuildError::WorkdirNotFound` if the target is not an existing directory;
    /// the context is left unchanged in that case.
    pub fn enter(&mut self, dir: impl AsRef<Path>) -> Result<WorkdirGuard<'_>, BuildError> {
        let target = self.resolve(dir);
        if !target.is_dir() {
            return Err(BuildError::WorkdirNotFound(target));
        }

        let restore_depth = self.stack.len();
        log::debug!("[Workdir] pushd {}", target.display());
        self.stack.push(target);
        Ok(WorkdirGuard {
            ctx: self,
            restore_depth,
        })
    }
}

/// Scope holding an entered directory. Restores the previous one on drop.
#[derive(Debug)]
pub struct WorkdirGuard<'a> {
    ctx: &'a mut WorkdirContext,
    restore_depth: usize,
}

impl WorkdirGuard<'_> {
    /// Directory that becomes current again once this guard is released.
    pub fn previous(&self) -> &Path {
        &self.ctx.stack[self.restore_depth - 1]
    }
}

impl Deref for WorkdirGuard<'_> {
    type Target = WorkdirContext;

    fn deref(&self) -> &WorkdirContext {
        self.ctx
    }
}

impl DerefMut for WorkdirGuard<'_> {
    fn deref_mut(&mut self) -> &mut WorkdirContext {
        self.ctx
    }
}

impl Drop for WorkdirGuard<'_> {
    fn drop(&mut self) {
        self.ctx.stack.truncate(self.restore_depth);
        log::debug!("[Workdir] popd -> {}", self.ctx.current().display());
    }
}
