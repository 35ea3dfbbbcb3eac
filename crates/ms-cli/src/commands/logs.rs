//! `ms logs` — Show logs of running services.

use clap::Args;
use ms_runtime::driver::LifecycleDriver;

use super::Session;

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Service keys (all when empty).
    pub services: Vec<String>,

    /// Follow log output.
    #[arg(short, long)]
    pub follow: bool,

    /// Number of lines to show from the end of each log.
    #[arg(short, long)]
    pub tail: Option<u32>,
}

/// Executes the `logs` command.
///
/// # Errors
///
/// Returns an error if no composition is running or the tool fails.
pub fn execute(session: &Session, args: &LogsArgs) -> anyhow::Result<()> {
    let driver = super::driver()?;
    let status = driver.logs(
        &session.config().compose_output_path,
        &args.services,
        args.follow,
        args.tail,
    )?;
    super::ensure_success("logs", status)
}
