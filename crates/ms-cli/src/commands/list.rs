//! `ms list` — Show the containers of the running composition.

use clap::Args;
use ms_compose::artifact;
use ms_runtime::driver::{LifecycleDriver, ensure_running};

use super::Session;

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list service keys containing this text.
    #[arg(long)]
    pub filter: Option<String>,
}

/// Executes the `list` command.
///
/// # Errors
///
/// Returns an error if no composition is running, nothing matches the
/// filter, or the tool exits unsuccessfully.
pub fn execute(session: &Session, args: &ListArgs) -> anyhow::Result<()> {
    let driver = super::driver()?;
    list_with(session, args, &driver)
}

/// Runs `list` against `driver`.
///
/// # Errors
///
/// See [`execute`].
pub fn list_with(
    session: &Session,
    args: &ListArgs,
    driver: &dyn LifecycleDriver,
) -> anyhow::Result<()> {
    let path = &session.config().compose_output_path;
    ensure_running(path)?;

    let keys = match &args.filter {
        Some(filter) => {
            let matching = artifact::service_keys(path)?
                .into_iter()
                .filter(|key| key.contains(filter.as_str()))
                .collect::<Vec<_>>();
            if matching.is_empty() {
                anyhow::bail!("no running service key matches '{filter}'");
            }
            matching
        }
        None => Vec::new(),
    };
    let status = driver.ps(path, &keys)?;
    super::ensure_success("ps", status)
}
