//! `ms attach` — Open a shell inside a running service.

use clap::Args;
use ms_runtime::driver::LifecycleDriver;

use super::Session;

/// Arguments for the `attach` command.
#[derive(Args, Debug)]
pub struct AttachArgs {
    /// Service key in the running composition.
    pub service: String,
}

/// Executes the `attach` command.
///
/// # Errors
///
/// Returns an error if no composition is running or the shell cannot be
/// opened in the service.
pub fn execute(session: &Session, args: &AttachArgs) -> anyhow::Result<()> {
    let driver = super::driver()?;
    let status = driver.attach(&session.config().compose_output_path, &args.service)?;
    if !status.success() {
        anyhow::bail!("could not attach to [{}], is it running?", args.service);
    }
    Ok(())
}
