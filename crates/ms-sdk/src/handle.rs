//! The narrow view of the core handed to plugin commands.

use ms_common::config::Config;
use ms_common::error::Result;
use ms_compose::{
    CompositionMerger, MergedComposition, ScratchArtifact, SelectionSet, ServiceCatalog,
    ServiceSelector,
};
use ms_runtime::driver::LifecycleDriver;

/// Selection, merging, and lifecycle driving for one invocation.
#[derive(Clone, Copy)]
pub struct CoreHandle<'a> {
    config: &'a Config,
    catalog: &'a ServiceCatalog,
    driver: &'a dyn LifecycleDriver,
}

impl<'a> CoreHandle<'a> {
    /// Bundles the invocation's configuration, catalog, and driver.
    #[must_use]
    pub const fn new(
        config: &'a Config,
        catalog: &'a ServiceCatalog,
        driver: &'a dyn LifecycleDriver,
    ) -> Self {
        Self {
            config,
            catalog,
            driver,
        }
    }

    /// Expands service and constellation tokens into a selection.
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` for a token that matches nothing.
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> Result<SelectionSet> {
        ServiceSelector::new(self.catalog, self.config).resolve(tokens)
    }

    /// Merges a selection in memory.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorLoad` or `CompositionConflict` on merge failure.
    pub fn merge(&self, selection: &SelectionSet) -> Result<MergedComposition> {
        CompositionMerger::new(self.config).merge(selection)
    }

    /// Merges a selection into a scratch artifact removed on drop.
    ///
    /// # Errors
    ///
    /// Returns any merge error, or an I/O error writing the artifact.
    pub fn write_scratch(
        &self,
        selection: &SelectionSet,
    ) -> Result<(MergedComposition, ScratchArtifact)> {
        CompositionMerger::new(self.config).write_scratch(selection)
    }

    /// The orchestration driver.
    #[must_use]
    pub fn driver(&self) -> &'a dyn LifecycleDriver {
        self.driver
    }
}

impl std::fmt::Debug for CoreHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreHandle")
            .field("base_dir", &self.config.base_dir)
            .field("services", &self.catalog.len())
            .finish_non_exhaustive()
    }
}
