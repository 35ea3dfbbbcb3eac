//! Blocking invocation of external tools.
//!
//! Every call runs to completion; there is no timeout and no cancellation.

use std::fmt;
use std::process::Command;

use ms_common::error::{MsError, Result};

/// Exit status of an external process.
///
/// `code` is `None` when the process was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    code: Option<i32>,
}

impl ExitStatus {
    /// A successful exit.
    pub const SUCCESS: Self = Self { code: Some(0) };

    /// Creates a status from an exit code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// A status for a process terminated by a signal.
    #[must_use]
    pub const fn signaled() -> Self {
        Self { code: None }
    }

    /// Returns `true` for a zero exit code.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Returns the exit code, if the process exited normally.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        self.code
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Captured result of a non-interactive process.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// How the process exited.
    pub status: ExitStatus,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

impl CapturedOutput {
    /// Best single-line description of a failure.
    ///
    /// The first `fatal:` or `error:` line of stderr wins; otherwise the
    /// non-empty lines of stderr (else stdout) are joined. An empty output
    /// falls back to the exit status.
    #[must_use]
    pub fn failure_detail(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>();
        if let Some(line) = lines
            .iter()
            .find(|l| l.starts_with("fatal:") || l.starts_with("error:"))
        {
            return (*line).to_string();
        }
        if lines.is_empty() {
            self.status.to_string()
        } else {
            lines.join(" / ")
        }
    }

    /// Converts an unsuccessful run into [`MsError::ProcessFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`MsError::ProcessFailed`] naming `program` if the process
    /// exited non-zero.
    pub fn check(self, program: impl Into<String>) -> Result<Self> {
        if self.status.success() {
            return Ok(self);
        }
        Err(MsError::ProcessFailed {
            program: program.into(),
            status: self.status.to_string(),
            message: self.failure_detail(),
        })
    }
}

/// Runs `cmd` with inherited stdio and waits for it.
///
/// # Errors
///
/// Returns [`MsError::Process`] if the program cannot be spawned.
pub fn run_inherited(cmd: &mut Command) -> Result<ExitStatus> {
    let program = program_name(cmd);
    tracing::debug!(program = %program, args = ?args_of(cmd), "running");
    let status = cmd.status().map_err(|e| MsError::Process {
        program,
        message: e.to_string(),
    })?;
    Ok(status.into())
}

/// Runs `cmd` with captured stdout/stderr and waits for it.
///
/// # Errors
///
/// Returns [`MsError::Process`] if the program cannot be spawned.
pub fn run_captured(cmd: &mut Command) -> Result<CapturedOutput> {
    let program = program_name(cmd);
    tracing::debug!(program = %program, args = ?args_of(cmd), "running (captured)");
    let output = cmd.output().map_err(|e| MsError::Process {
        program,
        message: e.to_string(),
    })?;
    Ok(CapturedOutput {
        status: output.status.into(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}
