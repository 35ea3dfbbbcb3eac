//! `ms <plugin> [args...]` — Run a command contributed by a plugin.

use clap::CommandFactory;
use ms_runtime::driver::compose::DetectOnUse;
use ms_sdk::{CoreHandle, PluginRegistry};

use super::{Cli, Session};
use crate::plugins;

/// Builds the registry from the plugins enabled in the configuration.
///
/// Built-in command names are reserved.
///
/// # Errors
///
/// Returns an error if an enabled plugin is unknown or registers a clashing
/// command.
pub fn registry(session: &Session) -> anyhow::Result<PluginRegistry> {
    let builtins = Cli::command()
        .get_subcommands()
        .map(|c| c.get_name().to_string())
        .chain(std::iter::once("help".to_string()))
        .collect::<Vec<_>>();
    let mut registry = PluginRegistry::with_reserved(builtins);
    registry.load(&session.config().plugins, plugins::AVAILABLE)?;
    Ok(registry)
}

/// Executes a plugin command.
///
/// The orchestration tool is only located if the command drives containers.
///
/// # Errors
///
/// Returns an error if the command is unknown or fails.
pub fn execute(session: &Session, argv: &[String]) -> anyhow::Result<()> {
    let Some((name, args)) = argv.split_first() else {
        anyhow::bail!("missing plugin command");
    };
    let registry = registry(session)?;
    if registry.get(name).is_none() {
        let known = registry.iter().map(|c| c.name()).collect::<Vec<_>>();
        anyhow::bail!(
            "unknown command '{name}' (plugin commands: {})",
            if known.is_empty() { "none enabled".to_string() } else { known.join(", ") }
        );
    }

    let catalog = session.catalog()?;
    let driver = DetectOnUse::new();
    let core = CoreHandle::new(session.config(), &catalog, &driver);
    registry.dispatch(name, &core, args)?;
    Ok(())
}
