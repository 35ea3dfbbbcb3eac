//! `ms pull` — Pull images for the selected services.

use clap::Args;
use ms_runtime::driver::LifecycleDriver;

use super::{SelectArgs, Session};

/// Arguments for the `pull` command.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Services whose images to pull.
    #[command(flatten)]
    pub select: SelectArgs,
}

/// Executes the `pull` command.
///
/// # Errors
///
/// Returns an error if selection or merging fails, or the pull exits
/// unsuccessfully.
pub fn execute(session: &Session, args: &PullArgs) -> anyhow::Result<()> {
    let selection = session.select(&args.select)?;
    let driver = super::driver()?;
    let (merged, artifact) = session.merger().write_scratch(&selection)?;
    let status = driver.pull(artifact.path(), &super::service_keys(&merged))?;
    super::ensure_success("pull", status)
}
