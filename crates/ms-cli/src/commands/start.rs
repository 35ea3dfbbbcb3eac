//! `ms start` — Merge the selected services and run them until they exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Args;
use ms_runtime::driver::{LifecycleDriver, up_then_down};

use super::{SelectArgs, Session};

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Services to start.
    #[command(flatten)]
    pub select: SelectArgs,
}

/// Executes the `start` command.
///
/// The merged artifact only lives while the services run. `down` always
/// follows `up`, including after Ctrl+C.
///
/// # Errors
///
/// Returns an error if selection or merging fails, or the orchestration
/// tool exits unsuccessfully without being interrupted.
pub fn execute(session: &Session, args: &StartArgs) -> anyhow::Result<()> {
    // Installed before the artifact exists so an early Ctrl+C cannot skip
    // its removal.
    let interrupted = install_interrupt_handler()?;
    let driver = super::driver()?;
    start_with(session, args, &driver, &interrupted)
}

/// Runs `start` against `driver`, treating a set `interrupted` flag as a
/// clean exit.
///
/// # Errors
///
/// See [`execute`].
pub fn start_with(
    session: &Session,
    args: &StartArgs,
    driver: &dyn LifecycleDriver,
    interrupted: &AtomicBool,
) -> anyhow::Result<()> {
    let selection = session.select(&args.select)?;
    let (merged, artifact) = session.merger().write_scratch(&selection)?;
    let keys = super::service_keys(&merged);
    tracing::info!(
        services = ?selection.names(),
        keys = keys.len(),
        artifact = %artifact.path().display(),
        "starting"
    );

    let status = up_then_down(driver, artifact.path(), &keys)?;
    drop(artifact);

    if interrupted.load(Ordering::SeqCst) {
        tracing::info!("interrupted; services torn down");
        return Ok(());
    }
    super::ensure_success("up", status)
}

/// Keeps Ctrl+C from killing `ms` so that teardown still runs.
///
/// The foreground tool receives the same signal and exits on its own.
fn install_interrupt_handler() -> anyhow::Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;
    Ok(interrupted)
}

#[cfg(test)]
mod tests {
    use ms_runtime::driver::ExitStatus;
    use ms_runtime::driver::recording::RecordingDriver;

    use super::*;
    use crate::commands::fixture;

    fn args(services: &[&str]) -> StartArgs {
        StartArgs {
            select: SelectArgs {
                services: services.iter().map(|s| (*s).to_string()).collect(),
                ignore: Vec::new(),
            },
        }
    }

    #[test]
    fn up_is_followed_by_down_and_artifact_removed() {
        let (_base, session) = fixture::workspace(&[
            ("svc-web", "services:\n  web: {}\n"),
            ("svc-worker", "services:\n  worker: {}\n"),
        ]);
        let driver = RecordingDriver::default();
        start_with(&session, &args(&[]), &driver, &AtomicBool::new(false)).expect("start");

        assert_eq!(driver.calls(), ["up web,worker", "down"]);
        assert!(!session.config().compose_output_path.exists());
    }

    #[test]
    fn failed_up_is_an_error_unless_interrupted() {
        let (_base, session) = fixture::workspace(&[("svc-web", "services:\n  web: {}\n")]);
        let driver = RecordingDriver {
            up_status: Some(ExitStatus::from_code(130)),
            ..RecordingDriver::default()
        };

        let err = start_with(&session, &args(&["svc-web"]), &driver, &AtomicBool::new(false))
            .unwrap_err();
        assert!(err.to_string().contains("up exited"));

        start_with(&session, &args(&["svc-web"]), &driver, &AtomicBool::new(true))
            .expect("interrupted start is clean");
        assert_eq!(driver.calls(), ["up web", "down", "up web", "down"]);
        assert!(!session.config().compose_output_path.exists());
    }
}
