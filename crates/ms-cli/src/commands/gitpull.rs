//! `ms gitpull` — Update every selected repository from its main branch.

use std::io::Write;

use clap::Args;
use ms_runtime::GitSyncer;
use ms_runtime::vcs::git::GitCli;

use super::{SelectArgs, Session};
use crate::output;

/// Arguments for the `gitpull` command.
#[derive(Args, Debug)]
pub struct GitpullArgs {
    /// Repositories to update.
    #[command(flatten)]
    pub select: SelectArgs,
}

/// Executes the `gitpull` command.
///
/// Every repository is attempted; failures are reported together at the
/// end.
///
/// # Errors
///
/// Returns an error if selection fails or any repository failed to sync.
pub fn execute(session: &Session, args: &GitpullArgs) -> anyhow::Result<()> {
    let selection = session.select(&args.select)?;
    let vcs = GitCli::new();
    let reports = GitSyncer::new(&vcs, &session.config().main_branch).sync_all(&selection);

    let mut stdout = std::io::stdout().lock();
    for report in &reports {
        writeln!(stdout, "{}", output::sync_line(report))?;
    }
    writeln!(stdout, "{}", output::sync_summary(&reports))?;

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} repositories failed to sync", reports.len());
    }
    Ok(())
}
