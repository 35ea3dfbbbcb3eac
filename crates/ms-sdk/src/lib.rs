//! # ms-sdk
//!
//! Extension surface for `ms`.
//!
//! A plugin is a statically linked registration function that adds named
//! commands to a [`PluginRegistry`](registry::PluginRegistry). When one of
//! those commands runs, its handler receives a
//! [`CoreHandle`](handle::CoreHandle): service selection, composition
//! merging, and the lifecycle driver. Nothing else of the core is exposed.
//!
//! # Example
//!
//! ```rust
//! use ms_sdk::registry::{PluginCommand, PluginRegistry};
//!
//! fn register(registry: &mut PluginRegistry) -> ms_common::error::Result<()> {
//!     registry.register(PluginCommand::new("count", "Count selected services", |core, args| {
//!         let selection = core.resolve(args)?;
//!         tracing::info!(count = selection.len(), "selected");
//!         Ok(())
//!     }))
//! }
//!
//! let mut registry = PluginRegistry::new();
//! register(&mut registry).expect("registered");
//! assert!(registry.get("count").is_some());
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod handle;
pub mod registry;

pub use handle::CoreHandle;
pub use registry::{PluginCommand, PluginRegistration, PluginRegistry};
