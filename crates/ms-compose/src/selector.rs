//! Expansion of selection tokens into a concrete, deduplicated service set.

use std::collections::{BTreeMap, HashSet};

use ms_common::config::Config;
use ms_common::error::{MsError, Result};

use crate::catalog::{Service, ServiceCatalog};

/// The ordered, duplicate-free set of services chosen for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    services: Vec<Service>,
}

impl SelectionSet {
    /// Iterates the selected services in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    /// Selected service names in selection order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of selected services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a Service;
    type IntoIter = std::slice::Iter<'a, Service>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}

/// Resolves service names and constellation names against a catalog.
#[derive(Debug, Clone, Copy)]
pub struct ServiceSelector<'a> {
    catalog: &'a ServiceCatalog,
    constellations: &'a BTreeMap<String, Vec<String>>,
}

impl<'a> ServiceSelector<'a> {
    /// Creates a selector over `catalog` using the configured constellations.
    #[must_use]
    pub const fn new(catalog: &'a ServiceCatalog, config: &'a Config) -> Self {
        Self::with_constellations(catalog, &config.constellations)
    }

    /// Creates a selector with an explicit constellation table.
    #[must_use]
    pub const fn with_constellations(
        catalog: &'a ServiceCatalog,
        constellations: &'a BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            catalog,
            constellations,
        }
    }

    /// Expands `tokens` into a selection.
    ///
    /// An empty token list selects the whole catalog. Each token is tried as
    /// a constellation first, then as a service name. The first occurrence
    /// of a service fixes its position; later ones are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::UnknownService`] for the first token (or
    /// constellation member) that matches nothing. No partial selection is
    /// returned.
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> Result<SelectionSet> {
        if tokens.is_empty() {
            return Ok(SelectionSet {
                services: self.catalog.iter().cloned().collect(),
            });
        }

        let mut seen = HashSet::new();
        let mut services = Vec::new();
        for token in tokens {
            for service in self.expand(token.as_ref())? {
                if seen.insert(service.name.as_str()) {
                    services.push(service.clone());
                }
            }
        }

        tracing::debug!(
            tokens = tokens.len(),
            selected = services.len(),
            "selection resolved"
        );
        Ok(SelectionSet { services })
    }

    /// Expands `tokens`, then removes every service that `ignore` expands to.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::UnknownService`] if any token in either list is
    /// unknown.
    pub fn resolve_excluding<S: AsRef<str>, I: AsRef<str>>(
        &self,
        tokens: &[S],
        ignore: &[I],
    ) -> Result<SelectionSet> {
        let mut selection = self.resolve(tokens)?;
        if ignore.is_empty() {
            return Ok(selection);
        }

        let mut ignored = HashSet::new();
        for token in ignore {
            ignored.extend(
                self.expand(token.as_ref())?
                    .into_iter()
                    .map(|s| s.name.as_str().to_string()),
            );
        }
        selection
            .services
            .retain(|s| !ignored.contains(s.name.as_str()));
        tracing::debug!(ignored = ignored.len(), remaining = selection.len(), "applied ignore list");
        Ok(selection)
    }

    fn expand(&self, token: &str) -> Result<Vec<&'a Service>> {
        if let Some(members) = self.constellations.get(token) {
            tracing::debug!(constellation = token, members = members.len(), "expanding constellation");
            return members
                .iter()
                .map(|member| self.lookup(member))
                .collect();
        }
        self.lookup(token).map(|s| vec![s])
    }

    fn lookup(&self, name: &str) -> Result<&'a Service> {
        self.catalog.get(name).ok_or_else(|| MsError::UnknownService {
            token: name.to_string(),
        })
    }
}
