//! `ms down` — Tear down the selected services.

use clap::Args;
use ms_runtime::driver::LifecycleDriver;

use super::{SelectArgs, Session};

/// Arguments for the `down` command.
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Services to tear down.
    #[command(flatten)]
    pub select: SelectArgs,
}

/// Executes the `down` command.
///
/// # Errors
///
/// Returns an error if selection or merging fails, or the teardown exits
/// unsuccessfully.
pub fn execute(session: &Session, args: &DownArgs) -> anyhow::Result<()> {
    let selection = session.select(&args.select)?;
    let driver = super::driver()?;
    let (_, artifact) = session.merger().write_scratch(&selection)?;
    let status = driver.down(artifact.path())?;
    super::ensure_success("down", status)
}
