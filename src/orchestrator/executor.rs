//! Stage execution: external tool invocation and exit-status handling.
//!
//! Every external program the pipeline touches goes through a [`ToolRunner`].
//! Production code uses [`SystemRunner`]; tests swap in recording doubles.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::error::{BuildError, EXIT_COMMAND_NOT_FOUND};
use crate::orchestrator::state::BuildStage;

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Stage the call belongs to
    pub stage: BuildStage,

    /// Program as configured (bare name, relative or absolute path)
    pub program: String,

    pub args: Vec<String>,

    /// Directory the program runs in
    pub cwd: PathBuf,

    /// Variables layered on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(stage: BuildStage, program: impl Into<String>, cwd: &Path) -> Self {
        Invocation {
            stage,
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    /// Program path handed to the OS.
    ///
    /// Anything containing a path separator is anchored to the invocation's
    /// directory; bare names are left for the OS search path.
    pub fn resolved_program(&self) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_absolute() || program.components().count() <= 1 {
            program.to_path_buf()
        } else {
            self.cwd.join(program)
        }
    }

    /// Shell-style rendering for logs and `plan` output.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Runs external programs and reports their exit status.
pub trait ToolRunner {
    /// Run the invocation to completion and return its exit status.
    ///
    /// An `Err` means the program could not be launched at all.
    fn run(&mut self, invocation: &Invocation) -> io::Result<i32>;
}

/// Production runner: blocking `std::process::Command` with inherited stdio,
/// so the operator sees each tool's own output.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<i32> {
        let status = Command::new(invocation.resolved_program())
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()?;

        Ok(exit_status_code(status))
    }
}

/// Exit status as a shell would report it: the tool's own code, or
/// 128 + signal number when it was killed.
pub fn exit_status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Run one invocation through the runner, turning a non-zero status or a launch
/// failure into [`BuildError::ExternalStepFailure`].
pub fn run_step<R: ToolRunner + ?Sized>(
    runner: &mut R,
    invocation: &Invocation,
) -> Result<(), BuildError> {
    log::info!(
        "[Build] [{}] Running '{}' in {}",
        invocation.stage,
        invocation.command_line(),
        invocation.cwd.display()
    );

    let code = match runner.run(invocation) {
        Ok(code) => code,
        Err(e) => {
            log::error!(
                "[Build] [{}] ✗ Could not launch '{}': {}",
                invocation.stage,
                invocation.program,
                e
            );
            EXIT_COMMAND_NOT_FOUND
        }
    };

    if code != 0 {
        log::error!(
            "[Build] [{}] ✗ '{}' exited with status {}",
            invocation.stage,
            invocation.program,
            code
        );
        return Err(BuildError::ExternalStepFailure {
            stage: invocation.stage,
            program: invocation.program.clone(),
            code,
        });
    }

    log::info!("[Build] [{}] ✓ '{}' succeeded", invocation.stage, invocation.program);
    Ok(())
}
