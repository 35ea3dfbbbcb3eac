//! `ms config` — Print the composition file currently on disk.

use std::io::Write;

use anyhow::Context;
use ms_runtime::driver::ensure_running;

use super::Session;

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if no composition file exists.
pub fn execute(session: &Session) -> anyhow::Result<()> {
    let path = &session.config().compose_output_path;
    ensure_running(path)?;
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    std::io::stdout().write_all(content.as_bytes())?;
    Ok(())
}
