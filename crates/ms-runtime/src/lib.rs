//! External-process layer for ms.
//!
//! - [`driver`]: the orchestration-tool seam ([`driver::LifecycleDriver`])
//!   and its `docker-compose` implementation.
//! - [`vcs`]: the version-control seam ([`vcs::Vcs`]) and its `git`
//!   implementation.
//! - [`sync`]: branch-preserving bulk update of service repositories.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod driver;
pub mod process;
pub mod sync;
pub mod vcs;

pub use driver::LifecycleDriver;
pub use sync::{GitSyncer, SyncFailure, SyncReport, SyncSuccess};
pub use vcs::Vcs;
