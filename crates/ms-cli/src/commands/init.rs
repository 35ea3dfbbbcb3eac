//! `ms init` — Write the merged composition file for use outside `ms`.

use std::io::Write;

use clap::Args;

use super::{SelectArgs, Session};

/// Arguments for the `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Services to include.
    #[command(flatten)]
    pub select: SelectArgs,
}

/// Executes the `init` command.
///
/// Unlike `start`, the artifact is left on disk.
///
/// # Errors
///
/// Returns an error if selection, merging, or writing fails.
pub fn execute(session: &Session, args: &InitArgs) -> anyhow::Result<()> {
    let selection = session.select(&args.select)?;
    let (merged, path) = session.merger().write_persistent(&selection)?;
    tracing::info!(keys = merged.len(), path = %path.display(), "composition written");
    writeln!(std::io::stdout(), "{}", path.display())?;
    Ok(())
}
