//! [`Vcs`] backed by the `git` command line.

use std::path::{Path, PathBuf};
use std::process::Command;

use ms_common::error::{MsError, Result};

use super::Vcs;
use crate::process::{self, CapturedOutput};

/// Remote that `pull` fetches from.
const REMOTE: &str = "origin";

/// Runs `git -C <repo> ...` non-interactively.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    /// Uses `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Uses an explicit git binary.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn git(&self, repo: &Path, args: &[&str]) -> Result<CapturedOutput> {
        let mut cmd = Command::new(&self.program);
        let _ = cmd
            .arg("-C")
            .arg(repo)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_MERGE_AUTOEDIT", "no");
        process::run_captured(&mut cmd)?.check(format!("git {}", args.join(" ")))
    }

    /// Requires `repo` to be the root of a work tree.
    ///
    /// git resolves `-C <dir>` upwards, so a plain directory nested in some
    /// other checkout would otherwise act on that checkout.
    fn ensure_root(&self, repo: &Path) -> Result<()> {
        let repo_state = |message: String| MsError::RepoState {
            repo: repo.to_path_buf(),
            message,
        };
        let toplevel = match self.git(repo, &["rev-parse", "--show-toplevel"]) {
            Ok(output) => PathBuf::from(output.stdout.trim()),
            Err(MsError::ProcessFailed { message, .. }) => return Err(repo_state(message)),
            Err(e) => return Err(e),
        };
        let expected = std::fs::canonicalize(repo).map_err(|e| MsError::io(repo, e))?;
        let actual = std::fs::canonicalize(&toplevel).map_err(|e| MsError::io(&toplevel, e))?;
        if actual != expected {
            return Err(repo_state(format!(
                "not a repository root (enclosing repository is {})",
                actual.display()
            )));
        }
        Ok(())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl Vcs for GitCli {
    fn current_branch(&self, repo: &Path) -> Result<String> {
        self.ensure_root(repo)?;
        let output = self.git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = output.stdout.trim();
        if branch.is_empty() || branch == "HEAD" {
            return Err(MsError::RepoState {
                repo: repo.to_path_buf(),
                message: "HEAD is detached".into(),
            });
        }
        Ok(branch.to_string())
    }

    fn checkout(&self, repo: &Path, branch: &str) -> Result<()> {
        let _ = self.git(repo, &["checkout", "--quiet", branch])?;
        Ok(())
    }

    fn pull(&self, repo: &Path, branch: &str) -> Result<()> {
        let _ = self.git(repo, &["pull", "--quiet", REMOTE, branch])?;
        Ok(())
    }
}
