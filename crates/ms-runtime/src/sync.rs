//! Branch-preserving bulk update of service repositories.
//!
//! Each selected repository is brought up to date on the main branch, one
//! after another. A repository that was on another branch is put back on
//! it afterwards, whether or not the pull worked. Failures are recorded per
//! repository and never stop the remaining ones.

use std::fmt;
use std::path::{Path, PathBuf};

use ms_common::types::ServiceName;
use ms_compose::selector::SelectionSet;
use thiserror::Error;

use crate::vcs::Vcs;

/// How a repository was synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSuccess {
    /// The repository was already on the main branch and was pulled there.
    PulledInPlace,
    /// The main branch was pulled and the original branch checked out again.
    PulledAndRestored {
        /// Branch the repository was returned to.
        branch: String,
    },
}

impl fmt::Display for SyncSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PulledInPlace => write!(f, "pulled"),
            Self::PulledAndRestored { branch } => write!(f, "pulled, back on {branch}"),
        }
    }
}

/// The step at which syncing a repository failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncFailure {
    /// The current branch could not be determined.
    #[error("cannot determine current branch: {message}")]
    RepoState {
        /// Underlying cause.
        message: String,
    },

    /// Switching to the main branch was refused; nothing else was attempted.
    #[error("checkout of {main} failed (left on {original}): {message}")]
    CheckoutMain {
        /// Main branch name.
        main: String,
        /// Branch the repository stayed on.
        original: String,
        /// Underlying cause.
        message: String,
    },

    /// Pulling the main branch failed.
    #[error("pull of {main} failed{}: {message}", .restored_to.as_ref().map(|b| format!(" (back on {b})")).unwrap_or_default())]
    Pull {
        /// Main branch name.
        main: String,
        /// Branch the repository was returned to, if it had to be.
        restored_to: Option<String>,
        /// Underlying cause.
        message: String,
    },

    /// Returning to the original branch failed.
    #[error("checkout back to {branch} failed{}: {message}", .pull_error.as_ref().map(|p| format!(" after failed pull ({p})")).unwrap_or_default())]
    Restore {
        /// Branch that could not be checked out again.
        branch: String,
        /// Pull failure that preceded the restore, if any.
        pull_error: Option<String>,
        /// Underlying cause.
        message: String,
    },
}

/// Result of syncing one service's repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Service whose repository was synced.
    pub service: ServiceName,
    /// Repository root.
    pub repo: PathBuf,
    /// What happened.
    pub outcome: Result<SyncSuccess, SyncFailure>,
}

impl SyncReport {
    /// Returns `true` if the repository synced cleanly.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Pulls the main branch of every selected repository.
#[derive(Debug)]
pub struct GitSyncer<'a, V: Vcs + ?Sized> {
    vcs: &'a V,
    main_branch: &'a str,
}

impl<'a, V: Vcs + ?Sized> GitSyncer<'a, V> {
    /// Creates a syncer that brings `main_branch` up to date.
    #[must_use]
    pub const fn new(vcs: &'a V, main_branch: &'a str) -> Self {
        Self { vcs, main_branch }
    }

    /// Syncs every service in selection order, one repository at a time.
    pub fn sync_all(&self, selection: &SelectionSet) -> Vec<SyncReport> {
        selection
            .iter()
            .map(|service| {
                let outcome = self.sync_repo(service.name.as_str(), service.repo_root());
                SyncReport {
                    service: service.name.clone(),
                    repo: service.repo_root().to_path_buf(),
                    outcome,
                }
            })
            .collect()
    }

    /// Syncs a single repository.
    pub fn sync_repo(&self, service: &str, repo: &Path) -> Result<SyncSuccess, SyncFailure> {
        let main = self.main_branch;
        let original = self
            .vcs
            .current_branch(repo)
            .map_err(|e| SyncFailure::RepoState {
                message: e.to_string(),
            })?;

        if original == main {
            tracing::info!(service, branch = main, "pulling");
            return self
                .vcs
                .pull(repo, main)
                .map(|()| SyncSuccess::PulledInPlace)
                .map_err(|e| SyncFailure::Pull {
                    main: main.to_string(),
                    restored_to: None,
                    message: e.to_string(),
                });
        }

        tracing::info!(service, from = %original, to = main, "switching branch to pull");
        self.vcs
            .checkout(repo, main)
            .map_err(|e| SyncFailure::CheckoutMain {
                main: main.to_string(),
                original: original.clone(),
                message: e.to_string(),
            })?;

        let pulled = self.vcs.pull(repo, main);
        if let Err(e) = &pulled {
            tracing::warn!(service, error = %e, "pull failed, restoring branch");
        }

        tracing::debug!(service, branch = %original, "restoring branch");
        if let Err(e) = self.vcs.checkout(repo, &original) {
            return Err(SyncFailure::Restore {
                branch: original,
                pull_error: pulled.err().map(|p| p.to_string()),
                message: e.to_string(),
            });
        }

        match pulled {
            Ok(()) => Ok(SyncSuccess::PulledAndRestored { branch: original }),
            Err(e) => Err(SyncFailure::Pull {
                main: main.to_string(),
                restored_to: Some(original),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use ms_common::error::{MsError, Result};
    use ms_compose::catalog::{Service, ServiceCatalog};
    use ms_compose::selector::ServiceSelector;

    use super::*;

    /// In-memory repositories keyed by path.
    #[derive(Default)]
    struct FakeVcs {
        branches: RefCell<HashMap<PathBuf, Option<String>>>,
        refuse_checkout: HashSet<(PathBuf, String)>,
        failing_pulls: HashSet<PathBuf>,
        log: RefCell<Vec<String>>,
    }

    impl FakeVcs {
        fn repo(mut self, path: &str, branch: Option<&str>) -> Self {
            let _ = self
                .branches
                .get_mut()
                .insert(PathBuf::from(path), branch.map(str::to_string));
            self
        }

        fn refuse(mut self, path: &str, branch: &str) -> Self {
            let _ = self
                .refuse_checkout
                .insert((PathBuf::from(path), branch.to_string()));
            self
        }

        fn failing_pull(mut self, path: &str) -> Self {
            let _ = self.failing_pulls.insert(PathBuf::from(path));
            self
        }

        fn branch_of(&self, path: &str) -> Option<String> {
            self.branches.borrow().get(Path::new(path)).cloned().flatten()
        }

        fn fail(message: &str) -> MsError {
            MsError::ProcessFailed {
                program: "git".into(),
                status: "exit code 1".into(),
                message: message.into(),
            }
        }
    }

    impl Vcs for FakeVcs {
        fn current_branch(&self, repo: &Path) -> Result<String> {
            self.log.borrow_mut().push(format!("branch {}", repo.display()));
            match self.branches.borrow().get(repo) {
                Some(Some(b)) => Ok(b.clone()),
                Some(None) => Err(Self::fail("HEAD is detached")),
                None => Err(Self::fail("not a git repository")),
            }
        }

        fn checkout(&self, repo: &Path, branch: &str) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("checkout {} {branch}", repo.display()));
            if self
                .refuse_checkout
                .contains(&(repo.to_path_buf(), branch.to_string()))
            {
                return Err(Self::fail("local changes would be overwritten"));
            }
            let _ = self
                .branches
                .borrow_mut()
                .insert(repo.to_path_buf(), Some(branch.to_string()));
            Ok(())
        }

        fn pull(&self, repo: &Path, branch: &str) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("pull {} {branch}", repo.display()));
            if self.failing_pulls.contains(repo) {
                return Err(Self::fail("could not resolve host"));
            }
            Ok(())
        }
    }

    fn selection(names: &[&str]) -> SelectionSet {
        let services = names
            .iter()
            .map(|n| Service {
                name: ServiceName::new(*n),
                directory: (*n).to_string(),
                root: PathBuf::from(format!("/base/{n}")),
                descriptor: PathBuf::from(format!("/base/{n}/docker-compose.yml")),
            })
            .collect();
        let catalog = ServiceCatalog::from_services(services).expect("catalog");
        let table = std::collections::BTreeMap::new();
        ServiceSelector::with_constellations(&catalog, &table)
            .resolve::<&str>(&[])
            .expect("selection")
    }

    #[test]
    fn master_branch_is_pulled_in_place() {
        let vcs = FakeVcs::default().repo("/base/a", Some("master"));
        let outcome = GitSyncer::new(&vcs, "master").sync_repo("a", Path::new("/base/a"));
        assert_eq!(outcome, Ok(SyncSuccess::PulledInPlace));
        assert!(!vcs.log.borrow().iter().any(|l| l.starts_with("checkout")));
    }

    #[test]
    fn feature_branch_is_restored_after_pull() {
        let vcs = FakeVcs::default().repo("/base/a", Some("feature-x"));
        let outcome = GitSyncer::new(&vcs, "master").sync_repo("a", Path::new("/base/a"));
        assert_eq!(
            outcome,
            Ok(SyncSuccess::PulledAndRestored {
                branch: "feature-x".into()
            })
        );
        assert_eq!(
            *vcs.log.borrow(),
            vec![
                "branch /base/a",
                "checkout /base/a master",
                "pull /base/a master",
                "checkout /base/a feature-x",
            ]
        );
        assert_eq!(vcs.branch_of("/base/a").as_deref(), Some("feature-x"));
    }

    #[test]
    fn failed_pull_still_restores_branch() {
        let vcs = FakeVcs::default()
            .repo("/base/a", Some("feature-x"))
            .failing_pull("/base/a");
        let outcome = GitSyncer::new(&vcs, "master").sync_repo("a", Path::new("/base/a"));

        match outcome {
            Err(SyncFailure::Pull { restored_to, .. }) => {
                assert_eq!(restored_to.as_deref(), Some("feature-x"));
            }
            other => panic!("expected pull failure, got {other:?}"),
        }
        assert_eq!(vcs.branch_of("/base/a").as_deref(), Some("feature-x"));
    }

    #[test]
    fn refused_checkout_attempts_nothing_else() {
        let vcs = FakeVcs::default()
            .repo("/base/a", Some("feature-x"))
            .refuse("/base/a", "master");
        let outcome = GitSyncer::new(&vcs, "master").sync_repo("a", Path::new("/base/a"));

        assert!(matches!(outcome, Err(SyncFailure::CheckoutMain { ref original, .. }) if original == "feature-x"));
        assert!(!vcs.log.borrow().iter().any(|l| l.starts_with("pull")));
        assert_eq!(vcs.branch_of("/base/a").as_deref(), Some("feature-x"));
    }

    #[test]
    fn failed_restore_reports_both_failures() {
        let vcs = FakeVcs::default()
            .repo("/base/a", Some("feature-x"))
            .refuse("/base/a", "feature-x")
            .failing_pull("/base/a");
        let outcome = GitSyncer::new(&vcs, "master").sync_repo("a", Path::new("/base/a"));

        let err = outcome.unwrap_err();
        assert!(matches!(err, SyncFailure::Restore { ref pull_error, .. } if pull_error.is_some()));
        let msg = err.to_string();
        assert!(msg.contains("feature-x"));
        assert!(msg.contains("could not resolve host"));
    }

    #[test]
    fn detached_head_is_repo_state_error() {
        let vcs = FakeVcs::default().repo("/base/a", None);
        let outcome = GitSyncer::new(&vcs, "master").sync_repo("a", Path::new("/base/a"));
        assert!(matches!(outcome, Err(SyncFailure::RepoState { .. })));
    }

    #[test]
    fn one_failure_does_not_stop_the_rest() {
        let vcs = FakeVcs::default()
            .repo("/base/b", Some("develop"))
            .repo("/base/c", Some("master"))
            .failing_pull("/base/c");
        let reports = GitSyncer::new(&vcs, "master").sync_all(&selection(&["a", "b", "c"]));

        let names: Vec<_> = reports.iter().map(|r| r.service.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(matches!(reports[0].outcome, Err(SyncFailure::RepoState { .. })));
        assert!(reports[1].is_success());
        assert!(matches!(reports[2].outcome, Err(SyncFailure::Pull { restored_to: None, .. })));
        assert_eq!(vcs.branch_of("/base/b").as_deref(), Some("develop"));
    }

    #[test]
    fn custom_main_branch_is_honoured() {
        let vcs = FakeVcs::default().repo("/base/a", Some("main"));
        let outcome = GitSyncer::new(&vcs, "main").sync_repo("a", Path::new("/base/a"));
        assert_eq!(outcome, Ok(SyncSuccess::PulledInPlace));
        assert!(vcs.log.borrow().contains(&"pull /base/a main".to_string()));
    }

    #[test]
    fn failure_messages_name_the_step() {
        let checkout = SyncFailure::CheckoutMain {
            main: "master".into(),
            original: "feature-x".into(),
            message: "dirty tree".into(),
        };
        assert_eq!(
            checkout.to_string(),
            "checkout of master failed (left on feature-x): dirty tree"
        );
        let pull = SyncFailure::Pull {
            main: "master".into(),
            restored_to: Some("feature-x".into()),
            message: "offline".into(),
        };
        assert_eq!(pull.to_string(), "pull of master failed (back on feature-x): offline");
    }
}
