//! Merging per-service descriptors into one composition.
//!
//! Services are visited in selection order and their service keys in
//! declaration order. A singleton key is kept from the first service that
//! declares it and silently dropped afterwards. Any other key declared
//! twice is a [`MsError::CompositionConflict`].
//!
//! Service bodies are copied verbatim. The orchestration tool resolves
//! relative paths in them (`build: .`, `./src:/app` bind mounts, `env_file`)
//! against the merged artifact's directory, not the service's own, so such
//! services should use absolute paths or a `build.context` that is valid
//! from the base directory. Relative paths are logged at debug level.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use ms_common::config::Config;
use ms_common::error::{MsError, Result};
use ms_common::types::ServiceName;
use serde_yaml::{Mapping, Value};

use crate::artifact::{self, ScratchArtifact};
use crate::descriptor::CompositionDescriptor;
use crate::selector::SelectionSet;

/// The single composition produced from a selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedComposition {
    version: Option<Value>,
    services: Mapping,
    volumes: Mapping,
    networks: Mapping,
    origins: HashMap<String, ServiceName>,
}

impl MergedComposition {
    /// Service keys in merge order.
    #[must_use]
    pub fn service_keys(&self) -> Vec<&str> {
        self.services.keys().filter_map(Value::as_str).collect()
    }

    /// Returns the definition body of a service key.
    #[must_use]
    pub fn service(&self, key: &str) -> Option<&Value> {
        self.services.get(key)
    }

    /// Returns the selected service whose descriptor contributed `key`.
    #[must_use]
    pub fn origin(&self, key: &str) -> Option<&ServiceName> {
        self.origins.get(key)
    }

    /// Number of service keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if the composition defines no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Renders the composition in the orchestration tool's YAML format.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        let mut doc = Mapping::new();
        if let Some(version) = &self.version {
            let _ = doc.insert("version".into(), version.clone());
        }
        let _ = doc.insert("services".into(), Value::Mapping(self.services.clone()));
        if !self.volumes.is_empty() {
            let _ = doc.insert("volumes".into(), Value::Mapping(self.volumes.clone()));
        }
        if !self.networks.is_empty() {
            let _ = doc.insert("networks".into(), Value::Mapping(self.networks.clone()));
        }
        Ok(serde_yaml::to_string(&doc)?)
    }

    fn absorb(
        &mut self,
        service: &ServiceName,
        descriptor: &CompositionDescriptor,
        singletons: &BTreeSet<String>,
    ) -> Result<()> {
        if self.version.is_none() {
            self.version = descriptor.version().cloned();
        }

        for (key, body) in descriptor.services() {
            if let Some(first) = self.origins.get(key) {
                if singletons.contains(key) {
                    tracing::debug!(key, kept = %first, dropped = %service, "collapsing singleton");
                    continue;
                }
                return Err(MsError::CompositionConflict {
                    key: key.to_string(),
                    first: first.to_string(),
                    second: service.to_string(),
                });
            }
            for path in relative_paths(body) {
                tracing::debug!(
                    key,
                    service = %service,
                    path = %path,
                    "relative path will resolve against the artifact directory"
                );
            }
            let _ = self.services.insert(key.into(), body.clone());
            let _ = self.origins.insert(key.to_string(), service.clone());
        }

        merge_first_wins(&mut self.volumes, descriptor.volumes());
        merge_first_wins(&mut self.networks, descriptor.networks());
        Ok(())
    }
}

fn merge_first_wins(into: &mut Mapping, from: &Mapping) {
    for (name, body) in from {
        if !into.contains_key(name) {
            let _ = into.insert(name.clone(), body.clone());
        }
    }
}

/// Host paths in a service body that are relative to its own directory.
fn relative_paths(body: &Value) -> Vec<String> {
    let is_relative = |p: &str| !p.is_empty() && !Path::new(p).is_absolute() && !p.contains("://");
    let is_dotted = |p: &str| p == "." || p == ".." || p.starts_with("./") || p.starts_with("../");
    let mut found = Vec::new();

    match body.get("build") {
        Some(Value::String(context)) if is_relative(context.as_str()) => found.push(context.clone()),
        Some(build @ Value::Mapping(_)) => {
            if let Some(context) = build.get("context").and_then(Value::as_str) {
                if is_relative(context) {
                    found.push(context.to_string());
                }
            }
        }
        _ => {}
    }

    for volume in body.get("volumes").and_then(Value::as_sequence).into_iter().flatten() {
        let source = match volume {
            Value::String(spec) => spec.split(':').next(),
            other => other.get("source").and_then(Value::as_str),
        };
        if let Some(source) = source.filter(|&s| is_dotted(s)) {
            found.push(source.to_string());
        }
    }

    match body.get("env_file") {
        Some(Value::String(file)) if is_relative(file.as_str()) => found.push(file.clone()),
        Some(Value::Sequence(files)) => found.extend(
            files
                .iter()
                .filter_map(|f| f.as_str().or_else(|| f.get("path").and_then(Value::as_str)))
                .filter(|&f| is_relative(f))
                .map(str::to_string),
        ),
        _ => {}
    }
    found
}

/// Merges already loaded descriptors, in the order given.
///
/// # Errors
///
/// Returns [`MsError::CompositionConflict`] when two services declare the
/// same non-singleton key.
pub fn merge_descriptors<'d, I>(descriptors: I, singletons: &BTreeSet<String>) -> Result<MergedComposition>
where
    I: IntoIterator<Item = (&'d ServiceName, &'d CompositionDescriptor)>,
{
    let mut merged = MergedComposition::default();
    for (service, descriptor) in descriptors {
        merged.absorb(service, descriptor, singletons)?;
    }
    Ok(merged)
}

/// Loads every selected service's descriptor and merges them.
///
/// # Errors
///
/// Returns [`MsError::DescriptorLoad`] for the first descriptor that cannot
/// be loaded, or [`MsError::CompositionConflict`] on a non-singleton
/// collision. Either aborts the whole merge.
pub fn merge(selection: &SelectionSet, singletons: &BTreeSet<String>) -> Result<MergedComposition> {
    let loaded = selection
        .iter()
        .map(|service| service.load_descriptor().map(|d| (&service.name, d)))
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_descriptors(loaded.iter().map(|(n, d)| (*n, d)), singletons)?;
    tracing::info!(
        services = selection.len(),
        keys = merged.len(),
        "composition merged"
    );
    Ok(merged)
}

/// Merges selections under the configured singleton policy and writes the
/// result to the configured artifact path.
#[derive(Debug, Clone)]
pub struct CompositionMerger<'a> {
    singletons: &'a BTreeSet<String>,
    output_path: &'a Path,
}

impl<'a> CompositionMerger<'a> {
    /// Creates a merger from the configuration.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            singletons: &config.singleton_services,
            output_path: &config.compose_output_path,
        }
    }

    /// Path the artifact is written to.
    #[must_use]
    pub const fn output_path(&self) -> &Path {
        self.output_path
    }

    /// Merges `selection` in memory.
    ///
    /// # Errors
    ///
    /// See [`merge`].
    pub fn merge(&self, selection: &SelectionSet) -> Result<MergedComposition> {
        merge(selection, self.singletons)
    }

    /// Merges `selection` and writes a scratch artifact that is removed when
    /// the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns any merge error, or [`MsError::Io`] if the artifact cannot be
    /// written. No artifact is left behind on error.
    pub fn write_scratch(&self, selection: &SelectionSet) -> Result<(MergedComposition, ScratchArtifact)> {
        let merged = self.merge(selection)?;
        let artifact = ScratchArtifact::create(self.output_path, &merged.to_yaml()?)?;
        tracing::info!(path = %artifact.path().display(), "merged composition written");
        Ok((merged, artifact))
    }

    /// Merges `selection` and writes an artifact that outlives the call.
    ///
    /// # Errors
    ///
    /// See [`CompositionMerger::write_scratch`].
    pub fn write_persistent(&self, selection: &SelectionSet) -> Result<(MergedComposition, PathBuf)> {
        let merged = self.merge(selection)?;
        artifact::write_atomic(self.output_path, &merged.to_yaml()?)?;
        tracing::info!(path = %self.output_path.display(), "merged composition written");
        Ok((merged, self.output_path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(service: &str, yaml: &str) -> (ServiceName, CompositionDescriptor) {
        (
            ServiceName::new(service),
            CompositionDescriptor::parse(service, yaml).expect("parse"),
        )
    }

    fn singletons(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    fn run(
        inputs: &[(ServiceName, CompositionDescriptor)],
        singles: &BTreeSet<String>,
    ) -> Result<MergedComposition> {
        merge_descriptors(inputs.iter().map(|(n, d)| (n, d)), singles)
    }

    const SVC_A: &str = "services:\n  web:\n    image: a/web\n  redis:\n    image: redis:6\n";
    const SVC_B: &str = "services:\n  worker:\n    image: b/worker\n  redis:\n    image: redis:7\n";

    #[test]
    fn singleton_keeps_first_declaration() {
        let inputs = [descriptor("svc-a", SVC_A), descriptor("svc-b", SVC_B)];
        let merged = run(&inputs, &singletons(&["redis"])).expect("merge");

        assert_eq!(merged.service_keys(), vec!["web", "redis", "worker"]);
        assert_eq!(
            merged.service("redis").expect("redis")["image"],
            Value::String("redis:6".into())
        );
        assert_eq!(merged.origin("redis").map(ServiceName::as_str), Some("svc-a"));
        assert_eq!(merged.origin("worker").map(ServiceName::as_str), Some("svc-b"));
    }

    #[test]
    fn singleton_winner_follows_input_order() {
        let inputs = [descriptor("svc-b", SVC_B), descriptor("svc-a", SVC_A)];
        let merged = run(&inputs, &singletons(&["redis"])).expect("merge");
        assert_eq!(
            merged.service("redis").expect("redis")["image"],
            Value::String("redis:7".into())
        );
    }

    #[test]
    fn same_input_order_is_deterministic() {
        let singles = singletons(&["redis"]);
        let first = run(&[descriptor("svc-a", SVC_A), descriptor("svc-b", SVC_B)], &singles)
            .expect("merge");
        let second = run(&[descriptor("svc-a", SVC_A), descriptor("svc-b", SVC_B)], &singles)
            .expect("merge");
        assert_eq!(first.to_yaml().expect("yaml"), second.to_yaml().expect("yaml"));
    }

    #[test]
    fn non_singleton_collision_is_conflict() {
        let inputs = [
            descriptor("svc-a", "services:\n  web: {image: a}\n"),
            descriptor("svc-b", "services:\n  web: {image: b}\n"),
        ];
        let err = run(&inputs, &singletons(&["redis"])).unwrap_err();
        match err {
            MsError::CompositionConflict { key, first, second } => {
                assert_eq!(key, "web");
                assert_eq!(first, "svc-a");
                assert_eq!(second, "svc-b");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn bodies_pass_through_unchanged() {
        let body = "services:\n  web:\n    image: a\n    environment:\n      A: '1'\n    depends_on: [db]\n  db:\n    image: pg\n";
        let inputs = [descriptor("svc-a", body)];
        let merged = run(&inputs, &BTreeSet::new()).expect("merge");
        let original = CompositionDescriptor::parse("svc-a", body).expect("parse");
        let (_, web) = original.services().next().expect("web");
        assert_eq!(merged.service("web"), Some(web));
    }

    #[test]
    fn version_comes_from_first_declaring_descriptor() {
        let inputs = [
            descriptor("a", "services:\n  x: {}\n"),
            descriptor("b", "version: '3'\nservices:\n  y: {}\n"),
            descriptor("c", "version: '2'\nservices:\n  z: {}\n"),
        ];
        let merged = run(&inputs, &BTreeSet::new()).expect("merge");
        let yaml = merged.to_yaml().expect("yaml");
        assert!(yaml.starts_with("version: '3'"), "got: {yaml}");
    }

    #[test]
    fn volumes_merge_first_wins() {
        let inputs = [
            descriptor("a", "services:\n  x: {}\nvolumes:\n  data: {driver: local}\n"),
            descriptor("b", "services:\n  y: {}\nvolumes:\n  data: {driver: nfs}\n  logs: {}\n"),
        ];
        let merged = run(&inputs, &BTreeSet::new()).expect("merge");
        let doc: Value = serde_yaml::from_str(&merged.to_yaml().expect("yaml")).expect("reparse");
        assert_eq!(doc["volumes"]["data"]["driver"], Value::String("local".into()));
        assert!(doc["volumes"].get("logs").is_some());
        assert!(doc.get("networks").is_none());
    }

    #[test]
    fn empty_selection_yields_empty_services() {
        let merged = run(&[], &BTreeSet::new()).expect("merge");
        assert!(merged.is_empty());
        let doc: Value = serde_yaml::from_str(&merged.to_yaml().expect("yaml")).expect("reparse");
        assert!(doc["services"].as_mapping().is_some_and(Mapping::is_empty));
    }

    #[test]
    fn relative_paths_finds_build_mounts_and_env_files() {
        let body: Value = serde_yaml::from_str(
            "build: .\n\
             volumes:\n  - ./src:/app\n  - data:/var/lib/data\n  - /abs:/abs\n\
             env_file:\n  - .env\n  - /etc/shared.env\n",
        )
        .expect("yaml");
        assert_eq!(relative_paths(&body), vec![".", "./src", ".env"]);
    }

    #[test]
    fn relative_paths_ignores_images_and_named_volumes() {
        let body: Value = serde_yaml::from_str(
            "image: redis:7\nbuild:\n  context: https://example.com/repo.git\nvolumes:\n  - cache:/data\n",
        )
        .expect("yaml");
        assert!(relative_paths(&body).is_empty());
    }
}
