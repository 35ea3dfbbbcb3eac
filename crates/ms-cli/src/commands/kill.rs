//! `ms kill` — Kill the running composition, or one of its services.

use clap::Args;
use ms_compose::artifact;
use ms_runtime::driver::LifecycleDriver;

use super::Session;

/// Arguments for the `kill` command.
#[derive(Args, Debug)]
pub struct KillArgs {
    /// Only kill this service key.
    #[arg(long)]
    pub service: Option<String>,

    /// Keep the composition file around afterwards.
    #[arg(long)]
    pub keep: bool,
}

/// Executes the `kill` command.
///
/// # Errors
///
/// Returns an error if no composition is running, the artifact cannot be
/// removed, or the tool exits unsuccessfully.
pub fn execute(session: &Session, args: &KillArgs) -> anyhow::Result<()> {
    let driver = super::driver()?;
    kill_with(session, args, &driver)
}

/// Runs `kill` against `driver`.
///
/// # Errors
///
/// See [`execute`].
pub fn kill_with(
    session: &Session,
    args: &KillArgs,
    driver: &dyn LifecycleDriver,
) -> anyhow::Result<()> {
    let path = &session.config().compose_output_path;
    let status = driver.kill(path, args.service.as_deref())?;
    if args.keep {
        tracing::info!(artifact = %path.display(), "keeping composition file");
    } else {
        let _ = artifact::remove(path)?;
    }
    super::ensure_success("kill", status)
}
