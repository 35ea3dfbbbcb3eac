//! A [`LifecycleDriver`] that records calls instead of running anything.
//!
//! Available to this crate's tests and, with the `testing` feature, to
//! downstream test suites.

use std::cell::RefCell;
use std::path::Path;

use ms_common::error::{MsError, Result};

use super::{ExitStatus, LifecycleDriver};

/// Records every call as a short line such as `"up web,redis"`.
///
/// `up` can be scripted to exit non-zero or to fail to launch; every other
/// call succeeds unless `status` is set.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    /// Calls in the order they were made.
    pub calls: RefCell<Vec<String>>,
    /// Status returned by `up`.
    pub up_status: Option<ExitStatus>,
    /// Status returned by every other call.
    pub status: Option<ExitStatus>,
    /// Makes `up` fail as if the tool were missing.
    pub up_fails_to_launch: bool,
    /// Makes `down` fail as if the tool were missing.
    pub down_fails_to_launch: bool,
}

impl RecordingDriver {
    /// Snapshot of the recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) -> ExitStatus {
        self.calls.borrow_mut().push(call.trim_end().to_string());
        self.status.unwrap_or(ExitStatus::SUCCESS)
    }

    fn launch_failure() -> MsError {
        MsError::Process {
            program: "recording".into(),
            message: "no such file".into(),
        }
    }
}

impl LifecycleDriver for RecordingDriver {
    fn up(&self, _artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        let _ = self.record(format!("up {}", services.join(",")));
        if self.up_fails_to_launch {
            return Err(Self::launch_failure());
        }
        Ok(self.up_status.unwrap_or(ExitStatus::SUCCESS))
    }

    fn down(&self, _artifact: &Path) -> Result<ExitStatus> {
        let status = self.record("down".into());
        if self.down_fails_to_launch {
            return Err(Self::launch_failure());
        }
        Ok(status)
    }

    fn pull(&self, _artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        Ok(self.record(format!("pull {}", services.join(","))))
    }

    fn attach(&self, _artifact: &Path, service: &str) -> Result<ExitStatus> {
        Ok(self.record(format!("attach {service}")))
    }

    fn logs(
        &self,
        _artifact: &Path,
        services: &[String],
        _follow: bool,
        _tail: Option<u32>,
    ) -> Result<ExitStatus> {
        Ok(self.record(format!("logs {}", services.join(","))))
    }

    fn restart(&self, _artifact: &Path, service: &str) -> Result<ExitStatus> {
        Ok(self.record(format!("restart {service}")))
    }

    fn run(&self, _artifact: &Path, service: &str, command: &[String]) -> Result<ExitStatus> {
        Ok(self.record(format!("run {service} {}", command.join(" "))))
    }

    fn kill(&self, _artifact: &Path, service: Option<&str>) -> Result<ExitStatus> {
        Ok(self.record(format!("kill {}", service.unwrap_or_default())))
    }

    fn stop(&self, _artifact: &Path) -> Result<ExitStatus> {
        Ok(self.record("stop".into()))
    }

    fn top(&self, _artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        Ok(self.record(format!("top {}", services.join(","))))
    }

    fn ps(&self, _artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        Ok(self.record(format!("ps {}", services.join(","))))
    }
}
