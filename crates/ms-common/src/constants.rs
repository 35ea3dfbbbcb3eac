//! System-wide constants and default paths.

use std::path::PathBuf;

/// File name of the persisted configuration inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".ms";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV_VAR: &str = "MS_CONFIG";

/// File name of the merged composition written into the base directory
/// when `DOCKER_COMPOSE_FILE` is not configured.
pub const DEFAULT_ARTIFACT_NAME: &str = "docker-compose-tmp.yml";

/// Composition descriptor names looked up at a service root, in priority order.
pub const DESCRIPTOR_FILE_NAMES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Branch that `gitpull` brings up to date when `MAIN_BRANCH` is unset.
pub const DEFAULT_MAIN_BRANCH: &str = "master";

/// Seconds exported as `COMPOSE_HTTP_TIMEOUT` to orchestration processes.
///
/// Starting many containers at once regularly exceeds the tool's default.
pub const COMPOSE_HTTP_TIMEOUT_SECS: u32 = 300;

/// Returns the default configuration file path, `~/.ms`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Expands a leading `~/` (or a bare `~`) against the home directory.
///
/// Paths without a tilde prefix, or with no resolvable home, are returned
/// unchanged.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_home_leaves_absolute_paths_alone() {
        assert_eq!(expand_home("/srv/code"), PathBuf::from("/srv/code"));
    }

    #[test]
    fn expand_home_leaves_relative_paths_alone() {
        assert_eq!(expand_home("code/~x"), PathBuf::from("code/~x"));
    }

    #[test]
    fn expand_home_resolves_tilde_prefix() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/code"), home.join("code"));
            assert_eq!(expand_home("~"), home);
        }
    }

    #[test]
    fn default_config_lives_in_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(default_config_path(), Some(home.join(".ms")));
        }
    }

    #[test]
    fn descriptor_names_prefer_docker_compose_yml() {
        assert_eq!(DESCRIPTOR_FILE_NAMES[0], "docker-compose.yml");
    }
}
