//! `ms top` — Show the processes running in each service.

use clap::Args;
use ms_runtime::driver::LifecycleDriver;

use super::Session;

/// Arguments for the `top` command.
#[derive(Args, Debug)]
pub struct TopArgs {
    /// Service keys to inspect (all when empty).
    pub services: Vec<String>,
}

/// Executes the `top` command.
///
/// # Errors
///
/// Returns an error if no composition is running or the tool exits
/// unsuccessfully.
pub fn execute(session: &Session, args: &TopArgs) -> anyhow::Result<()> {
    let driver = super::driver()?;
    top_with(session, args, &driver)
}

/// Runs `top` against `driver`.
///
/// # Errors
///
/// See [`execute`].
pub fn top_with(
    session: &Session,
    args: &TopArgs,
    driver: &dyn LifecycleDriver,
) -> anyhow::Result<()> {
    let status = driver.top(&session.config().compose_output_path, &args.services)?;
    super::ensure_success("top", status)
}
