//! Formatted output helpers for CLI commands.

use ms_compose::Service;
use ms_runtime::SyncReport;

/// One line describing how a repository sync went.
#[must_use]
pub fn sync_line(report: &SyncReport) -> String {
    match &report.outcome {
        Ok(success) => format!("ok      {:<24} {success}", report.service),
        Err(failure) => format!("FAILED  {:<24} {failure}", report.service),
    }
}

/// Totals line printed after all repositories were processed.
#[must_use]
pub fn sync_summary(reports: &[SyncReport]) -> String {
    let failed = reports.iter().filter(|r| !r.is_success()).count();
    format!(
        "{} of {} repositories updated, {failed} failed",
        reports.len() - failed,
        reports.len()
    )
}

/// Name, repository, and descriptor of a service.
#[must_use]
pub fn service_line(service: &Service) -> String {
    format!(
        "{:<24} {}  ({})",
        service.name,
        service.directory,
        service.descriptor.display()
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ms_common::types::ServiceName;
    use ms_runtime::{SyncFailure, SyncSuccess};

    use super::*;

    fn report(name: &str, outcome: Result<SyncSuccess, SyncFailure>) -> SyncReport {
        SyncReport {
            service: ServiceName::new(name),
            repo: PathBuf::from("/base").join(name),
            outcome,
        }
    }

    #[test]
    fn success_line_names_restored_branch() {
        let line = sync_line(&report(
            "api",
            Ok(SyncSuccess::PulledAndRestored {
                branch: "feature-x".into(),
            }),
        ));
        assert!(line.starts_with("ok"));
        assert!(line.contains("api"));
        assert!(line.contains("back on feature-x"));
    }

    #[test]
    fn failure_line_names_failing_step() {
        let line = sync_line(&report(
            "web",
            Err(SyncFailure::Pull {
                main: "master".into(),
                restored_to: Some("feature-x".into()),
                message: "no remote".into(),
            }),
        ));
        assert!(line.starts_with("FAILED"));
        assert!(line.contains("pull of master failed (back on feature-x): no remote"));
    }

    #[test]
    fn summary_counts_failures() {
        let reports = [
            report("a", Ok(SyncSuccess::PulledInPlace)),
            report(
                "b",
                Err(SyncFailure::RepoState {
                    message: "not a git repository".into(),
                }),
            ),
            report("c", Ok(SyncSuccess::PulledInPlace)),
        ];
        assert_eq!(sync_summary(&reports), "2 of 3 repositories updated, 1 failed");
    }
}
