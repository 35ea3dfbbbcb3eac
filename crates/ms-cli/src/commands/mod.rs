//! CLI command definitions and dispatch.

pub mod attach;
pub mod config;
pub mod down;
pub mod gitpull;
pub mod init;
pub mod kill;
pub mod list;
pub mod logs;
pub mod plugin;
pub mod pull;
pub mod restart;
pub mod run;
pub mod start;
pub mod stop;
pub mod top;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ms_common::config::{Config, ConfigStore};
use ms_common::constants::CONFIG_ENV_VAR;
use ms_compose::{CompositionMerger, MergedComposition, SelectionSet, ServiceCatalog, ServiceSelector};
use ms_runtime::driver::ExitStatus;
use ms_runtime::driver::compose::DockerCompose;

/// ms — run sibling service repositories as one local composition.
#[derive(Parser, Debug)]
#[command(name = "ms", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the JSON configuration file (defaults to ~/.ms).
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge the selected services and run them in the foreground.
    Start(start::StartArgs),
    /// Open a shell in a running service.
    Attach(attach::AttachArgs),
    /// Pull images for the selected services.
    Pull(pull::PullArgs),
    /// Update every selected repository from its main branch.
    Gitpull(gitpull::GitpullArgs),
    /// Write the merged composition file and print its path.
    Init(init::InitArgs),
    /// Tear down the selected services.
    Down(down::DownArgs),
    /// Print the composition file currently on disk.
    Config,
    /// Show logs of running services.
    Logs(logs::LogsArgs),
    /// Restart a running service.
    Restart(restart::RestartArgs),
    /// Run a one-off command in a throwaway container.
    Run(run::RunArgs),
    /// Kill the running services and remove the composition file.
    Kill(kill::KillArgs),
    /// Stop the running services and remove the composition file.
    Stop,
    /// Show the processes running in each service.
    Top(top::TopArgs),
    /// List the containers of the running composition.
    List(list::ListArgs),
    /// Run a plugin command.
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Service and constellation tokens shared by the selecting commands.
#[derive(Args, Debug, Default, Clone)]
pub struct SelectArgs {
    /// Services or constellations to include (all services when empty).
    pub services: Vec<String>,

    /// Services or constellations to leave out.
    #[arg(long, num_args = 1..)]
    pub ignore: Vec<String>,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let session = Session::load(cli.config)?;
    match cli.command {
        Command::Start(args) => start::execute(&session, &args),
        Command::Attach(args) => attach::execute(&session, &args),
        Command::Pull(args) => pull::execute(&session, &args),
        Command::Gitpull(args) => gitpull::execute(&session, &args),
        Command::Init(args) => init::execute(&session, &args),
        Command::Down(args) => down::execute(&session, &args),
        Command::Config => config::execute(&session),
        Command::Logs(args) => logs::execute(&session, &args),
        Command::Restart(args) => restart::execute(&session, &args),
        Command::Run(args) => run::execute(&session, &args),
        Command::Kill(args) => kill::execute(&session, &args),
        Command::Stop => stop::execute(&session),
        Command::Top(args) => top::execute(&session, &args),
        Command::List(args) => list::execute(&session, &args),
        Command::External(argv) => plugin::execute(&session, &argv),
    }
}

/// Loaded configuration for one invocation.
#[derive(Debug)]
pub struct Session {
    config: Config,
}

impl Session {
    /// Loads and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or invalid.
    pub fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let store = match path {
            Some(path) => ConfigStore::new(path),
            None => ConfigStore::from_env()?,
        };
        let config = store.load()?;
        tracing::debug!(
            base_dir = %config.base_dir.display(),
            artifact = %config.compose_output_path.display(),
            "configuration loaded"
        );
        Ok(Self { config })
    }

    #[cfg(test)]
    pub const fn from_config(config: Config) -> Self {
        Self { config }
    }

    #[cfg(test)]
    pub const fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// The loaded configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Scans the base directory for services.
    ///
    /// # Errors
    ///
    /// Returns an error if the base directory cannot be read or two
    /// services share a name.
    pub fn catalog(&self) -> anyhow::Result<ServiceCatalog> {
        Ok(ServiceCatalog::build(&self.config)?)
    }

    /// Resolves selection tokens against a fresh catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be built or a token is unknown.
    pub fn select(&self, args: &SelectArgs) -> anyhow::Result<SelectionSet> {
        let catalog = self.catalog()?;
        let selection = ServiceSelector::new(&catalog, &self.config)
            .resolve_excluding(&args.services, &args.ignore)?;
        tracing::debug!(services = ?selection.names(), "selection resolved");
        Ok(selection)
    }

    /// Merger writing to the configured artifact path.
    pub fn merger(&self) -> CompositionMerger<'_> {
        CompositionMerger::new(&self.config)
    }
}

/// Locates the orchestration tool.
///
/// # Errors
///
/// Returns an error if neither `docker-compose` nor `docker` is installed.
pub fn driver() -> anyhow::Result<DockerCompose> {
    DockerCompose::detect().context("cannot drive containers")
}

/// Merged service keys, in artifact order.
pub fn service_keys(merged: &MergedComposition) -> Vec<String> {
    merged.service_keys().into_iter().map(str::to_string).collect()
}

/// Turns a non-zero exit of the orchestration tool into an error.
///
/// # Errors
///
/// Returns an error naming `what` if `status` is not success.
pub fn ensure_success(what: &str, status: ExitStatus) -> anyhow::Result<()> {
    if status.success() {
        Ok(())
    } else {
        anyhow::bail!("{what} exited with {status}")
    }
}
