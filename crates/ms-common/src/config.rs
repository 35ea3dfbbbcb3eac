//! Configuration model and the store that loads it.
//!
//! The configuration is a JSON document (by default `~/.ms`) with
//! upper-case keys. It is loaded once per invocation into an immutable
//! [`Config`] which every component receives by reference.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants;
use crate::error::{MsError, Result};

/// Root configuration for one `ms` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory whose immediate subdirectories are service repositories.
    pub base_dir: PathBuf,
    /// Where the merged composition is written.
    pub compose_output_path: PathBuf,
    /// Directory name to display/lookup name.
    pub name_mapping: BTreeMap<String, String>,
    /// Constellation name to its ordered member service names.
    pub constellations: BTreeMap<String, Vec<String>>,
    /// Service keys collapsed to a single definition across a merge.
    pub singleton_services: BTreeSet<String>,
    /// Plugin commands to register at startup.
    pub plugins: Vec<String>,
    /// Branch that `gitpull` brings up to date.
    pub main_branch: String,
}

impl Config {
    /// Creates a configuration rooted at `base_dir` with every optional
    /// field at its default.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            compose_output_path: base_dir.join(constants::DEFAULT_ARTIFACT_NAME),
            base_dir,
            name_mapping: BTreeMap::new(),
            constellations: BTreeMap::new(),
            singleton_services: BTreeSet::new(),
            plugins: Vec::new(),
            main_branch: constants::DEFAULT_MAIN_BRANCH.to_string(),
        }
    }

    /// Parses a configuration document without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Config`] if the JSON is malformed or `BASE_DIR`
    /// is missing or empty.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(content)
            .map_err(|e| MsError::config(format!("malformed configuration: {e}")))?;
        raw.into_config()
    }

    /// Returns `true` if `key` is a configured singleton service key.
    #[must_use]
    pub fn is_singleton(&self, key: &str) -> bool {
        self.singleton_services.contains(key)
    }

    /// Returns the members of a constellation, if `name` is one.
    #[must_use]
    pub fn constellation(&self, name: &str) -> Option<&[String]> {
        self.constellations.get(name).map(Vec::as_slice)
    }

    /// Checks that the configured paths are usable.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Config`] if `base_dir` is not an existing directory.
    pub fn validate(&self) -> Result<()> {
        if !self.base_dir.is_dir() {
            return Err(MsError::config(format!(
                "BASE_DIR {} is not a directory",
                self.base_dir.display()
            )));
        }
        Ok(())
    }
}

/// Persisted form of the configuration, keyed as it is on disk.
///
/// Every optional key tolerates an explicit `null`.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(rename = "BASE_DIR")]
    base_dir: Option<String>,
    #[serde(rename = "DOCKER_COMPOSE_FILE")]
    compose_file: Option<String>,
    #[serde(rename = "SERVICE_MAPPING")]
    service_mapping: Option<BTreeMap<String, String>>,
    #[serde(rename = "SERVICE_CONSTELLATIONS")]
    constellations: Option<BTreeMap<String, Vec<String>>>,
    #[serde(rename = "SINGLETON_SERVICES")]
    singletons: Option<Vec<String>>,
    #[serde(rename = "PLUGINS")]
    plugins: Option<Vec<String>>,
    #[serde(rename = "MAIN_BRANCH")]
    main_branch: Option<String>,
}

impl RawConfig {
    fn into_config(self) -> Result<Config> {
        let base_dir = self
            .base_dir
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| MsError::config("required key BASE_DIR is missing"))?;

        let mut config = Config::new(constants::expand_home(&base_dir));
        if let Some(file) = self.compose_file.filter(|f| !f.trim().is_empty()) {
            config.compose_output_path = constants::expand_home(&file);
        }
        config.name_mapping = self.service_mapping.unwrap_or_default();
        config.constellations = self.constellations.unwrap_or_default();
        config.singleton_services = self.singletons.unwrap_or_default().into_iter().collect();
        config.plugins = self.plugins.unwrap_or_default();
        if let Some(branch) = self.main_branch.filter(|b| !b.trim().is_empty()) {
            config.main_branch = branch;
        }

        if let Some((dir, _)) = config
            .name_mapping
            .iter()
            .find(|(_, mapped)| mapped.trim().is_empty())
        {
            return Err(MsError::config(format!(
                "SERVICE_MAPPING maps \"{dir}\" to an empty name"
            )));
        }
        Ok(config)
    }
}

/// Loads the persisted configuration.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Creates a store reading from an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store for `$MS_CONFIG`, falling back to `~/.ms`.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Config`] if neither location can be determined.
    pub fn from_env() -> Result<Self> {
        if let Some(path) = std::env::var_os(constants::CONFIG_ENV_VAR).filter(|p| !p.is_empty())
        {
            return Ok(Self::new(path));
        }
        constants::default_config_path()
            .map(Self::new)
            .ok_or_else(|| MsError::config("cannot locate home directory for the config file"))
    }

    /// Returns the path this store reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads, parses, and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Config`] if the file is missing, malformed,
    /// lacks `BASE_DIR`, or points at a base directory that does not exist.
    pub fn load(&self) -> Result<Config> {
        tracing::debug!(path = %self.path.display(), "loading configuration");

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MsError::config(format!(
                    "config file {} not found (set BASE_DIR there, or point {} elsewhere)",
                    self.path.display(),
                    constants::CONFIG_ENV_VAR
                )));
            }
            Err(e) => return Err(MsError::io(&self.path, e)),
        };

        let config = Config::from_json_str(&content)?;
        config.validate()?;
        tracing::debug!(
            base_dir = %config.base_dir.display(),
            artifact = %config.compose_output_path.display(),
            constellations = config.constellations.len(),
            singletons = config.singleton_services.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}
