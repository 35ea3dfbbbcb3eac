//! Bulk sync against real git repositories.
//!
//! Each test builds a bare "remote" and a working clone in a temporary
//! directory. Tests return early when `git` is not installed.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::process::Command;

use ms_runtime::vcs::Vcs;
use ms_runtime::vcs::git::GitCli;
use ms_runtime::{GitSyncer, SyncFailure, SyncSuccess};

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=ms", "-c", "user.email=ms@example.invalid"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .status()
        .expect("spawn git");
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Creates `<tmp>/remote.git` and `<tmp>/work` with one commit on master,
/// then leaves `work` on `feature-x`.
fn repo_on_feature_branch(tmp: &Path) -> std::path::PathBuf {
    let remote = tmp.join("remote.git");
    let work = tmp.join("work");
    std::fs::create_dir_all(&remote).expect("mkdir remote");
    std::fs::create_dir_all(&work).expect("mkdir work");

    git(&remote, &["init", "--quiet", "--bare"]);
    git(&work, &["init", "--quiet"]);
    git(&work, &["symbolic-ref", "HEAD", "refs/heads/master"]);
    std::fs::write(work.join("docker-compose.yml"), "services: {}\n").expect("write");
    git(&work, &["add", "."]);
    git(&work, &["commit", "--quiet", "-m", "initial"]);
    git(&work, &["remote", "add", "origin", remote.to_str().expect("utf-8")]);
    git(&work, &["push", "--quiet", "origin", "master"]);
    git(&work, &["checkout", "--quiet", "-b", "feature-x"]);
    work
}

#[test]
fn sync_returns_to_feature_branch() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let work = repo_on_feature_branch(tmp.path());
    let vcs = GitCli::new();

    let outcome = GitSyncer::new(&vcs, "master").sync_repo("work", &work);

    assert_eq!(
        outcome,
        Ok(SyncSuccess::PulledAndRestored {
            branch: "feature-x".into()
        })
    );
    assert_eq!(vcs.current_branch(&work).expect("branch"), "feature-x");
}

#[test]
fn sync_restores_branch_when_pull_fails() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let work = repo_on_feature_branch(tmp.path());
    git(&work, &["remote", "remove", "origin"]);
    let vcs = GitCli::new();

    let outcome = GitSyncer::new(&vcs, "master").sync_repo("work", &work);

    assert!(
        matches!(outcome, Err(SyncFailure::Pull { ref restored_to, .. }) if restored_to.as_deref() == Some("feature-x")),
        "got {outcome:?}"
    );
    assert_eq!(vcs.current_branch(&work).expect("branch"), "feature-x");
}

#[test]
fn sync_leaves_repo_untouched_when_master_checkout_fails() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let work = repo_on_feature_branch(tmp.path());
    git(&work, &["remote", "remove", "origin"]);
    git(&work, &["branch", "--quiet", "-D", "master"]);
    let vcs = GitCli::new();

    let outcome = GitSyncer::new(&vcs, "master").sync_repo("work", &work);

    assert!(matches!(outcome, Err(SyncFailure::CheckoutMain { .. })), "got {outcome:?}");
    assert_eq!(vcs.current_branch(&work).expect("branch"), "feature-x");
}

#[test]
fn sync_on_master_pulls_in_place() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let work = repo_on_feature_branch(tmp.path());
    git(&work, &["checkout", "--quiet", "master"]);
    let vcs = GitCli::new();

    let outcome = GitSyncer::new(&vcs, "master").sync_repo("work", &work);

    assert_eq!(outcome, Ok(SyncSuccess::PulledInPlace));
    assert_eq!(vcs.current_branch(&work).expect("branch"), "master");
}

#[test]
fn sync_reports_non_repository() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let vcs = GitCli::new();
    let outcome = GitSyncer::new(&vcs, "master").sync_repo("plain", tmp.path());
    assert!(matches!(outcome, Err(SyncFailure::RepoState { .. })));
}

#[test]
fn plain_directory_inside_another_repository_is_left_alone() {
    if !git_available() {
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let work = repo_on_feature_branch(tmp.path());
    let service = work.join("svc-plain");
    std::fs::create_dir_all(&service).expect("mkdir");
    let vcs = GitCli::new();

    let outcome = GitSyncer::new(&vcs, "master").sync_repo("svc-plain", &service);

    assert!(
        matches!(outcome, Err(SyncFailure::RepoState { ref message }) if message.contains("not a repository root")),
        "got {outcome:?}"
    );
    assert_eq!(vcs.current_branch(&work).expect("branch"), "feature-x");
    let reflog = Command::new("git")
        .arg("-C")
        .arg(&work)
        .args(["reflog", "--format=%gs"])
        .output()
        .expect("reflog");
    let reflog = String::from_utf8_lossy(&reflog.stdout);
    assert!(!reflog.contains("to master"), "enclosing repository was switched: {reflog}");
}
