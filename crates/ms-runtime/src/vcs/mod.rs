//! Version-control access used by the bulk sync.

pub mod git;

use std::path::Path;

use ms_common::error::Result;

/// The three repository operations the bulk sync needs.
pub trait Vcs {
    /// Returns the name of the checked-out branch.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo` is not the root of a repository, or if
    /// HEAD is detached.
    fn current_branch(&self, repo: &Path) -> Result<String>;

    /// Checks out `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout is refused.
    fn checkout(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Pulls `branch` from the default remote into the checked-out branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails.
    fn pull(&self, repo: &Path, branch: &str) -> Result<()>;
}
