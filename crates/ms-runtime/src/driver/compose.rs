//! [`LifecycleDriver`] backed by the `docker-compose` command line.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use ms_common::constants::COMPOSE_HTTP_TIMEOUT_SECS;
use ms_common::error::{MsError, Result};

use super::{ExitStatus, LifecycleDriver, ensure_running};
use crate::process;

/// Invokes `docker-compose -f <artifact> ...` (or `docker compose ...`).
#[derive(Debug, Clone)]
pub struct DockerCompose {
    program: PathBuf,
    prefix: Vec<OsString>,
}

impl DockerCompose {
    /// Locates the orchestration tool on `PATH`.
    ///
    /// Prefers a standalone `docker-compose` binary and falls back to the
    /// `docker compose` plugin.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Process`] if neither is installed.
    pub fn detect() -> Result<Self> {
        if let Ok(program) = which::which("docker-compose") {
            tracing::debug!(program = %program.display(), "using docker-compose");
            return Ok(Self::with_program(program, Vec::<OsString>::new()));
        }
        if let Ok(program) = which::which("docker") {
            tracing::debug!(program = %program.display(), "using docker compose plugin");
            return Ok(Self::with_program(program, ["compose"]));
        }
        Err(MsError::Process {
            program: "docker-compose".into(),
            message: "neither docker-compose nor docker was found on PATH".into(),
        })
    }

    /// Uses an explicit program, with arguments placed before `-f`.
    #[must_use]
    pub fn with_program<I, S>(program: impl Into<PathBuf>, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            prefix: prefix.into_iter().map(Into::into).collect(),
        }
    }

    fn command<I, S>(&self, artifact: &Path, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut cmd = Command::new(&self.program);
        let _ = cmd
            .args(&self.prefix)
            .arg("-f")
            .arg(artifact)
            .args(args.into_iter().map(Into::into))
            .env("COMPOSE_HTTP_TIMEOUT", COMPOSE_HTTP_TIMEOUT_SECS.to_string());
        cmd
    }

    fn invoke<I, S>(&self, artifact: &Path, args: I) -> Result<ExitStatus>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut cmd = self.command(artifact, args);
        let status = process::run_inherited(&mut cmd)?;
        tracing::debug!(%status, "orchestration tool exited");
        Ok(status)
    }
}

impl LifecycleDriver for DockerCompose {
    fn up(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        tracing::info!(services = ?services, "compose up");
        self.invoke(artifact, std::iter::once("up").chain(services.iter().map(String::as_str)))
    }

    fn down(&self, artifact: &Path) -> Result<ExitStatus> {
        tracing::info!("compose down");
        self.invoke(artifact, ["down"])
    }

    fn pull(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        tracing::info!(services = ?services, "compose pull");
        self.invoke(artifact, std::iter::once("pull").chain(services.iter().map(String::as_str)))
    }

    fn attach(&self, artifact: &Path, service: &str) -> Result<ExitStatus> {
        ensure_running(artifact)?;
        tracing::info!(service, "attaching shell");
        self.invoke(artifact, ["exec", service, "bash"])
    }

    fn logs(
        &self,
        artifact: &Path,
        services: &[String],
        follow: bool,
        tail: Option<u32>,
    ) -> Result<ExitStatus> {
        ensure_running(artifact)?;
        let mut args = vec!["logs".to_string()];
        if follow {
            args.push("--follow".into());
        }
        if let Some(lines) = tail {
            args.push(format!("--tail={lines}"));
        }
        args.extend(services.iter().cloned());
        self.invoke(artifact, args)
    }

    fn restart(&self, artifact: &Path, service: &str) -> Result<ExitStatus> {
        ensure_running(artifact)?;
        tracing::info!(service, "restarting service");
        self.invoke(artifact, ["restart", service])
    }

    fn run(&self, artifact: &Path, service: &str, command: &[String]) -> Result<ExitStatus> {
        tracing::info!(service, command = ?command, "running one-off container");
        let args = ["run", "--rm", service]
            .into_iter()
            .map(str::to_string)
            .chain(command.iter().cloned());
        self.invoke(artifact, args)
    }

    fn kill(&self, artifact: &Path, service: Option<&str>) -> Result<ExitStatus> {
        ensure_running(artifact)?;
        tracing::info!(service = service.unwrap_or("*"), "killing containers");
        self.invoke(artifact, std::iter::once("kill").chain(service))
    }

    fn stop(&self, artifact: &Path) -> Result<ExitStatus> {
        ensure_running(artifact)?;
        tracing::info!("stopping containers");
        self.invoke(artifact, ["stop"])
    }

    fn top(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        ensure_running(artifact)?;
        self.invoke(
            artifact,
            std::iter::once("top").chain(services.iter().map(String::as_str)),
        )
    }

    fn ps(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        ensure_running(artifact)?;
        self.invoke(
            artifact,
            std::iter::once("ps").chain(services.iter().map(String::as_str)),
        )
    }
}

/// Locates the orchestration tool the first time it is needed.
///
/// Commands that may never touch containers (plugin commands) use this so
/// that a machine without docker can still run them.
#[derive(Debug, Default)]
pub struct DetectOnUse {
    detected: OnceLock<DockerCompose>,
}

impl DetectOnUse {
    /// Creates a driver that has not looked for the tool yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn driver(&self) -> Result<&DockerCompose> {
        if let Some(driver) = self.detected.get() {
            return Ok(driver);
        }
        let driver = DockerCompose::detect()?;
        Ok(self.detected.get_or_init(|| driver))
    }
}

impl LifecycleDriver for DetectOnUse {
    fn up(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        self.driver()?.up(artifact, services)
    }

    fn down(&self, artifact: &Path) -> Result<ExitStatus> {
        self.driver()?.down(artifact)
    }

    fn pull(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        self.driver()?.pull(artifact, services)
    }

    fn attach(&self, artifact: &Path, service: &str) -> Result<ExitStatus> {
        self.driver()?.attach(artifact, service)
    }

    fn logs(
        &self,
        artifact: &Path,
        services: &[String],
        follow: bool,
        tail: Option<u32>,
    ) -> Result<ExitStatus> {
        self.driver()?.logs(artifact, services, follow, tail)
    }

    fn restart(&self, artifact: &Path, service: &str) -> Result<ExitStatus> {
        self.driver()?.restart(artifact, service)
    }

    fn run(&self, artifact: &Path, service: &str, command: &[String]) -> Result<ExitStatus> {
        self.driver()?.run(artifact, service, command)
    }

    fn kill(&self, artifact: &Path, service: Option<&str>) -> Result<ExitStatus> {
        self.driver()?.kill(artifact, service)
    }

    fn stop(&self, artifact: &Path) -> Result<ExitStatus> {
        self.driver()?.stop(artifact)
    }

    fn top(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        self.driver()?.top(artifact, services)
    }

    fn ps(&self, artifact: &Path, services: &[String]) -> Result<ExitStatus> {
        self.driver()?.ps(artifact, services)
    }
}
