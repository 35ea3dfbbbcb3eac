//! Unified error types for the ms workspace.
//!
//! Selection, merge, and configuration failures abort a command and are
//! reported through [`MsError`]. Per-repository git failures are values of
//! their own (see `ms-runtime`) so one repository cannot abort the others.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum MsError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is missing, malformed, or inconsistent.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A selection token names neither a service nor a constellation.
    #[error("unknown service or constellation: \"{token}\"")]
    UnknownService {
        /// The offending token.
        token: String,
    },

    /// A service's composition descriptor is missing or malformed.
    #[error("could not load composition descriptor for service \"{service}\": {message}")]
    DescriptorLoad {
        /// Service whose descriptor failed to load.
        service: String,
        /// Underlying cause.
        message: String,
    },

    /// Two selected services declare the same non-singleton key.
    #[error(
        "composition conflict: \"{key}\" is declared by both \"{first}\" and \"{second}\" \
         (add it to SINGLETON_SERVICES if it should be shared)"
    )]
    CompositionConflict {
        /// The colliding service key.
        key: String,
        /// Service that declared the key first.
        first: String,
        /// Service that declared it again.
        second: String,
    },

    /// A directory is not the root of a repository on a named branch.
    #[error("{}: {message}", .repo.display())]
    RepoState {
        /// Directory that was expected to be a repository root.
        repo: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// An external process could not be spawned.
    #[error("failed to run {program}: {message}")]
    Process {
        /// Program that failed to launch.
        program: String,
        /// Description of the failure.
        message: String,
    },

    /// An external process ran and exited unsuccessfully.
    #[error("{program} exited with {status}: {message}")]
    ProcessFailed {
        /// Program and arguments that were run.
        program: String,
        /// Exit status as reported by the process layer.
        status: String,
        /// What the process reported on failure.
        message: String,
    },

    /// A command that needs a running composition found none.
    #[error("no running composition: {message}")]
    NotRunning {
        /// Description of what was expected.
        message: String,
    },

    /// A plugin failed to register or execute.
    #[error("plugin \"{name}\": {message}")]
    Plugin {
        /// Plugin command name.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// YAML serialization or deserialization failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl MsError {
    /// Builds a [`MsError::Config`] from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Builds a [`MsError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MsError>;
