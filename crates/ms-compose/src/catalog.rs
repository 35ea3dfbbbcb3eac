//! Service discovery under the base directory.
//!
//! Every immediate subdirectory holding a composition descriptor is a
//! service. Its lookup name is the directory name unless `SERVICE_MAPPING`
//! renames it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use ms_common::config::Config;
use ms_common::error::{MsError, Result};
use ms_common::types::ServiceName;

use crate::descriptor::CompositionDescriptor;

/// One orchestratable unit: a directory with a descriptor and a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Lookup and display name.
    pub name: ServiceName,
    /// Directory name under the base directory.
    pub directory: String,
    /// Absolute service directory; also the repository root.
    pub root: PathBuf,
    /// Path of the service's composition descriptor.
    pub descriptor: PathBuf,
}

impl Service {
    /// Returns the repository root of this service.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.root
    }

    /// Loads this service's composition descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::DescriptorLoad`] if the descriptor is missing or
    /// malformed.
    pub fn load_descriptor(&self) -> Result<CompositionDescriptor> {
        CompositionDescriptor::load(self.name.as_str(), &self.descriptor)
    }
}

/// All services discovered under a base directory, in directory-name order.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: Vec<Service>,
    index: HashMap<String, usize>,
}

impl ServiceCatalog {
    /// Builds the catalog from the configured base directory and mapping.
    ///
    /// # Errors
    ///
    /// See [`ServiceCatalog::scan`].
    pub fn build(config: &Config) -> Result<Self> {
        Self::scan(&config.base_dir, &config.name_mapping)
    }

    /// Enumerates `base_dir` and applies `name_mapping`.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Io`] if the directory cannot be listed, or
    /// [`MsError::Config`] if two services end up with the same name.
    pub fn scan(base_dir: &Path, name_mapping: &BTreeMap<String, String>) -> Result<Self> {
        tracing::debug!(base_dir = %base_dir.display(), "scanning for services");

        let entries = std::fs::read_dir(base_dir).map_err(|e| MsError::io(base_dir, e))?;
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MsError::io(base_dir, e))?;
            let root = entry.path();
            if !root.is_dir() {
                continue;
            }
            let Some(directory) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!(path = %root.display(), "skipping non UTF-8 directory name");
                continue;
            };
            let Some(descriptor) = CompositionDescriptor::find(&root) else {
                continue;
            };
            found.push((directory, root, descriptor));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));

        let services = found
            .into_iter()
            .map(|(directory, root, descriptor)| Service {
                name: ServiceName::new(
                    name_mapping
                        .get(&directory)
                        .cloned()
                        .unwrap_or_else(|| directory.clone()),
                ),
                directory,
                root,
                descriptor,
            })
            .collect();

        let catalog = Self::from_services(services)?;
        tracing::debug!(services = catalog.len(), "service catalog built");
        Ok(catalog)
    }

    /// Builds a catalog from already discovered services, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Config`] if two services share a name.
    pub fn from_services(services: Vec<Service>) -> Result<Self> {
        let mut index = HashMap::with_capacity(services.len());
        for (pos, service) in services.iter().enumerate() {
            if let Some(prev) = index.insert(service.name.as_str().to_string(), pos) {
                return Err(MsError::config(format!(
                    "directories \"{}\" and \"{}\" both resolve to service name \"{}\"",
                    services[prev].directory, service.directory, service.name
                )));
            }
        }
        Ok(Self { services, index })
    }

    /// Looks a service up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Service> {
        self.index.get(name).map(|&pos| &self.services[pos])
    }

    /// Iterates services in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    /// Service names in catalog order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
