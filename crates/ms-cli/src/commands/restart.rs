//! `ms restart` — Restart a running service.

use clap::Args;
use ms_runtime::driver::LifecycleDriver;

use super::Session;

/// Arguments for the `restart` command.
#[derive(Args, Debug)]
pub struct RestartArgs {
    /// Service key in the running composition.
    pub service: String,
}

/// Executes the `restart` command.
///
/// # Errors
///
/// Returns an error if no composition is running or the restart fails.
pub fn execute(session: &Session, args: &RestartArgs) -> anyhow::Result<()> {
    let driver = super::driver()?;
    let status = driver.restart(&session.config().compose_output_path, &args.service)?;
    super::ensure_success("restart", status)
}
