//! Per-service composition descriptors.
//!
//! A descriptor is the service's own `docker-compose.yml` (or one of the
//! other accepted names). Only its top-level `version`, `services`,
//! `volumes`, and `networks` keys take part in a merge; every service body
//! is carried through untouched.

use std::path::{Path, PathBuf};

use ms_common::constants::DESCRIPTOR_FILE_NAMES;
use ms_common::error::{MsError, Result};
use serde_yaml::{Mapping, Value};

/// The parsed composition descriptor of one service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionDescriptor {
    version: Option<Value>,
    services: Vec<(String, Value)>,
    volumes: Mapping,
    networks: Mapping,
}

impl CompositionDescriptor {
    /// Returns the descriptor path inside `dir`, probing the accepted file
    /// names in priority order.
    #[must_use]
    pub fn find(dir: &Path) -> Option<PathBuf> {
        DESCRIPTOR_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Reads and parses the descriptor at `path` on behalf of `service`.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::DescriptorLoad`] naming `service` if the file
    /// cannot be read or is not a valid descriptor.
    pub fn load(service: &str, path: &Path) -> Result<Self> {
        tracing::debug!(service, path = %path.display(), "loading composition descriptor");
        let content = std::fs::read_to_string(path).map_err(|e| MsError::DescriptorLoad {
            service: service.to_string(),
            message: format!("{}: {e}", path.display()),
        })?;
        Self::parse(service, &content)
    }

    /// Parses descriptor text on behalf of `service`.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::DescriptorLoad`] if the text is not YAML, is not a
    /// mapping, lacks a `services` mapping, or uses a non-string service key.
    pub fn parse(service: &str, content: &str) -> Result<Self> {
        let load_error = |message: String| MsError::DescriptorLoad {
            service: service.to_string(),
            message,
        };

        let document: Value =
            serde_yaml::from_str(content).map_err(|e| load_error(format!("invalid YAML: {e}")))?;
        let Value::Mapping(mut root) = document else {
            return Err(load_error("top level is not a mapping".into()));
        };

        let services = match root.remove("services") {
            Some(Value::Mapping(services)) => services,
            Some(Value::Null) | None => {
                return Err(load_error("no `services` section".into()));
            }
            Some(_) => return Err(load_error("`services` is not a mapping".into())),
        };

        let services = services
            .into_iter()
            .map(|(key, body)| match key {
                Value::String(name) => Ok((name, body)),
                other => Err(load_error(format!(
                    "service key {} is not a string",
                    serde_yaml::to_string(&other).unwrap_or_default().trim()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            version: root.remove("version"),
            services,
            volumes: take_mapping(&mut root, "volumes"),
            networks: take_mapping(&mut root, "networks"),
        })
    }

    /// Returns the declared compose file format version, if any.
    #[must_use]
    pub const fn version(&self) -> Option<&Value> {
        self.version.as_ref()
    }

    /// Iterates service keys and bodies in declaration order.
    pub fn services(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.services.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates service keys in declaration order.
    pub fn service_keys(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|(k, _)| k.as_str())
    }

    /// Top-level named volumes.
    #[must_use]
    pub const fn volumes(&self) -> &Mapping {
        &self.volumes
    }

    /// Top-level named networks.
    #[must_use]
    pub const fn networks(&self) -> &Mapping {
        &self.networks
    }
}

fn take_mapping(root: &mut Mapping, key: &str) -> Mapping {
    match root.remove(key) {
        Some(Value::Mapping(m)) => m,
        _ => Mapping::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
version: '2'
services:
  web:
    image: acme/web
    ports: ['8000:8000']
  redis:
    image: redis:6
volumes:
  data: {}
";

    #[test]
    fn parse_keeps_declaration_order() {
        let d = CompositionDescriptor::parse("svc", SAMPLE).expect("parse");
        assert_eq!(d.service_keys().collect::<Vec<_>>(), vec!["web", "redis"]);
    }

    #[test]
    fn parse_carries_bodies_unchanged() {
        let d = CompositionDescriptor::parse("svc", SAMPLE).expect("parse");
        let (_, web) = d.services().next().expect("web");
        assert_eq!(web["image"], Value::String("acme/web".into()));
        assert_eq!(web["ports"][0], Value::String("8000:8000".into()));
    }

    #[test]
    fn parse_reads_version_and_volumes() {
        let d = CompositionDescriptor::parse("svc", SAMPLE).expect("parse");
        assert_eq!(d.version(), Some(&Value::String("2".into())));
        assert!(d.volumes().contains_key("data"));
        assert!(d.networks().is_empty());
    }

    #[test]
    fn missing_services_section_fails() {
        let err = CompositionDescriptor::parse("svc-a", "version: '2'\n").unwrap_err();
        assert!(matches!(err, MsError::DescriptorLoad { ref service, .. } if service == "svc-a"));
    }

    #[test]
    fn scalar_document_fails() {
        let err = CompositionDescriptor::parse("svc", "just text").unwrap_err();
        assert!(err.to_string().contains("not a mapping"));
    }

    #[test]
    fn invalid_yaml_fails() {
        let err = CompositionDescriptor::parse("svc", "services: [unclosed").unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
    }

    #[test]
    fn non_string_service_key_fails() {
        let err = CompositionDescriptor::parse("svc", "services:\n  1: {}\n").unwrap_err();
        assert!(err.to_string().contains("not a string"));
    }

    #[test]
    fn find_prefers_docker_compose_yml() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("compose.yaml"), "services: {}").expect("write");
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}").expect("write");
        let found = CompositionDescriptor::find(dir.path()).expect("found");
        assert!(found.ends_with("docker-compose.yml"));
    }

    #[test]
    fn find_returns_none_without_descriptor() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(CompositionDescriptor::find(dir.path()).is_none());
    }

    #[test]
    fn load_missing_file_names_service() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = CompositionDescriptor::load("billing", &dir.path().join("nope.yml")).unwrap_err();
        assert!(err.to_string().contains("billing"));
    }
}
