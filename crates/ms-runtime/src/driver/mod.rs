//! Orchestration driver abstraction.
//!
//! The core never talks to the container tooling directly; it hands a
//! merged artifact path and service keys to a [`LifecycleDriver`].

pub mod compose;
#[cfg(any(test, feature = "testing"))]
pub mod recording;

use std::path::Path;

use ms_common::error::{MsError, Result};

pub use crate::process::ExitStatus;

/// Drives the external container-orchestration tool.
///
/// Implementors block until the tool exits and report its status. A
/// non-zero status is not an error at this layer.
pub trait LifecycleDriver {
    /// Brings the given services of the artifact up in the foreground.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be launched.
    fn up(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus>;

    /// Tears down everything the artifact describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be launched.
    fn down(&self, artifact: &Path) -> Result<ExitStatus>;

    /// Pulls images for the given services.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be launched.
    fn pull(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus>;

    /// Opens an interactive shell in a running service.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::NotRunning`] if no composition is running, or an
    /// error if the tool cannot be launched.
    fn attach(&self, artifact: &Path, service: &str) -> Result<ExitStatus>;

    /// Shows logs of running services.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::NotRunning`] if no composition is running, or an
    /// error if the tool cannot be launched.
    fn logs(&self, artifact: &Path, services: &[String], follow: bool, tail: Option<u32>)
    -> Result<ExitStatus>;

    /// Restarts a running service.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::NotRunning`] if no composition is running, or an
    /// error if the tool cannot be launched.
    fn restart(&self, artifact: &Path, service: &str) -> Result<ExitStatus>;

    /// Runs `command` in a one-off container of `service`, removed on exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be launched.
    fn run(&self, artifact: &Path, service: &str, command: &[String]) -> Result<ExitStatus>;

    /// Kills the running containers of one service, or of all of them.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::NotRunning`] if no composition is running, or an
    /// error if the tool cannot be launched.
    fn kill(&self, artifact: &Path, service: Option<&str>) -> Result<ExitStatus>;

    /// Stops every running container of the composition.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::NotRunning`] if no composition is running, or an
    /// error if the tool cannot be launched.
    fn stop(&self, artifact: &Path) -> Result<ExitStatus>;

    /// Shows the processes running in each service.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::NotRunning`] if no composition is running, or an
    /// error if the tool cannot be launched.
    fn top(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus>;

    /// Lists the containers of the given services with their state.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::NotRunning`] if no composition is running, or an
    /// error if the tool cannot be launched.
    fn ps(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus>;
}

/// Checks that a composition is running, i.e. its artifact is on disk.
///
/// # Errors
///
/// Returns [`MsError::NotRunning`] if the artifact does not exist.
pub fn ensure_running(artifact: &Path) -> Result<()> {
    if artifact.is_file() {
        return Ok(());
    }
    Err(MsError::NotRunning {
        message: format!(
            "{} does not exist; start services with `ms start` first",
            artifact.display()
        ),
    })
}

/// Runs `up` in the foreground and then always runs `down`.
///
/// `down` is attempted whether `up` exited cleanly, failed, was interrupted,
/// or could not be launched at all. The status (or error) of `up` is
/// returned; a failing `down` is logged.
///
/// # Errors
///
/// Returns the launch error of `up`, or of `down` if `up` itself succeeded
/// in launching.
pub fn up_then_down<D: LifecycleDriver + ?Sized>(
    driver: &D,
    artifact: &Path,
    services: &[String],
) -> Result<ExitStatus> {
    tracing::info!(artifact = %artifact.display(), services = services.len(), "bringing services up");
    let up = driver.up(artifact, services);

    tracing::info!(artifact = %artifact.display(), "tearing services down");
    match driver.down(artifact) {
        Ok(status) if !status.success() => {
            tracing::warn!(%status, "down exited unsuccessfully");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "down could not be run");
            if up.is_ok() {
                return Err(e);
            }
        }
    }
    up
}
