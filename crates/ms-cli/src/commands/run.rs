//! `ms run` — Run a one-off command in a throwaway container of one service.

use clap::Args;
use ms_common::config::Config;
use ms_compose::MergedComposition;
use ms_runtime::driver::LifecycleDriver;

use super::{SelectArgs, Session};

/// Service key used when a repository defines several.
const DEFAULT_SERVICE_KEY: &str = "web";

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Service key to run the command in (e.g. web, worker).
    #[arg(long)]
    pub service: Option<String>,

    /// Service (repository directory) whose composition is used.
    pub directory: String,

    /// Command and its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the service is unknown, no service key can be
/// chosen, or the command exits unsuccessfully.
pub fn execute(session: &Session, args: &RunArgs) -> anyhow::Result<()> {
    let driver = super::driver()?;
    run_with(session, args, &driver)
}

/// Runs `run` against `driver`.
///
/// Does nothing while a composition is running; attaching to it is the
/// way in then.
///
/// # Errors
///
/// See [`execute`].
pub fn run_with(
    session: &Session,
    args: &RunArgs,
    driver: &dyn LifecycleDriver,
) -> anyhow::Result<()> {
    let config = session.config();
    if config.compose_output_path.is_file() {
        tracing::warn!(
            artifact = %config.compose_output_path.display(),
            "a composition is already running; attach to one of its services instead"
        );
        return Ok(());
    }

    let selection = session.select(&SelectArgs {
        services: vec![args.directory.clone()],
        ignore: Vec::new(),
    })?;
    let (merged, artifact) = session.merger().write_scratch(&selection)?;
    let key = pick_service(&merged, config, args.service.as_deref())?;
    tracing::info!(service = %key, command = ?args.command, "running one-off container");

    let status = driver.run(artifact.path(), &key, &args.command)?;
    drop(artifact);
    super::ensure_success("run", status)
}

/// Chooses the service key to run in.
///
/// A requested key wins. Otherwise the only non-singleton key is used, and
/// failing that [`DEFAULT_SERVICE_KEY`].
fn pick_service(
    merged: &MergedComposition,
    config: &Config,
    requested: Option<&str>,
) -> anyhow::Result<String> {
    let keys = merged.service_keys();
    if let Some(requested) = requested {
        if keys.contains(&requested) {
            return Ok(requested.to_string());
        }
        anyhow::bail!(
            "service key '{requested}' is not defined (available: {})",
            keys.join(", ")
        );
    }

    let own = keys
        .iter()
        .copied()
        .filter(|key| !config.is_singleton(key))
        .collect::<Vec<_>>();
    match own.as_slice() {
        [only] => Ok((*only).to_string()),
        _ if keys.contains(&DEFAULT_SERVICE_KEY) => Ok(DEFAULT_SERVICE_KEY.to_string()),
        _ => anyhow::bail!(
            "cannot choose a service key among [{}]; pass --service",
            keys.join(", ")
        ),
    }
}
