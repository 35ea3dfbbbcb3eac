//! # ms-compose
//!
//! Topology resolution and merge engine.
//!
//! Handles:
//! - **Catalog**: discovery of service directories under the base directory.
//! - **Selector**: expansion of service and constellation tokens into a
//!   deduplicated, ordered selection.
//! - **Descriptor**: loading of per-service composition descriptors.
//! - **Merger**: singleton-collapsing merge of the selected descriptors.
//! - **Artifact**: atomic, scoped writing of the merged composition.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod artifact;
pub mod catalog;
pub mod descriptor;
pub mod merger;
pub mod selector;

pub use artifact::ScratchArtifact;
pub use catalog::{Service, ServiceCatalog};
pub use descriptor::CompositionDescriptor;
pub use merger::{CompositionMerger, MergedComposition};
pub use selector::{SelectionSet, ServiceSelector};
