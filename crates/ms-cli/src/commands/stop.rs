//! `ms stop` — Stop the running composition and remove its file.

use ms_compose::artifact;
use ms_runtime::driver::LifecycleDriver;

use super::Session;

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if no composition is running, the artifact cannot be
/// removed, or the tool exits unsuccessfully.
pub fn execute(session: &Session) -> anyhow::Result<()> {
    let driver = super::driver()?;
    stop_with(session, &driver)
}

/// Runs `stop` against `driver`.
///
/// # Errors
///
/// See [`execute`].
pub fn stop_with(session: &Session, driver: &dyn LifecycleDriver) -> anyhow::Result<()> {
    let path = &session.config().compose_output_path;
    let status = driver.stop(path)?;
    if artifact::remove(path)? {
        tracing::info!(artifact = %path.display(), "composition stopped");
    }
    super::ensure_success("stop", status)
}
