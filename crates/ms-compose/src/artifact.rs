//! The scratch composition file handed to the orchestration tool.
//!
//! Writes go through a temporary file in the destination directory and are
//! renamed into place, so a failed write never leaves a partial artifact.
//! A [`ScratchArtifact`] removes its file when dropped unless persisted.

use std::io::Write;
use std::path::{Path, PathBuf};

use ms_common::error::{MsError, Result};

use crate::descriptor::CompositionDescriptor;

/// Writes `contents` to `path` atomically.
///
/// # Errors
///
/// Returns [`MsError::Io`] if the parent directory cannot be created or the
/// temporary file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| MsError::io(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| MsError::io(parent, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| MsError::io(tmp.path(), e))?;
    let _file = tmp.persist(path).map_err(|e| MsError::io(path, e.error))?;
    Ok(())
}

/// A merged composition on disk, owned by the current invocation.
#[derive(Debug)]
pub struct ScratchArtifact {
    path: PathBuf,
    keep: bool,
}

impl ScratchArtifact {
    /// Atomically writes `contents` to `path` and takes ownership of the file.
    ///
    /// # Errors
    ///
    /// See [`write_atomic`].
    pub fn create(path: impl Into<PathBuf>, contents: &str) -> Result<Self> {
        let path = path.into();
        write_atomic(&path, contents)?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "scratch artifact written");
        Ok(Self { path, keep: false })
    }

    /// Path of the artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases ownership so the file survives this value.
    #[must_use]
    pub fn persist(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScratchArtifact {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = remove(&self.path) {
            tracing::warn!(error = %e, "could not remove scratch artifact");
        }
    }
}

/// Removes an artifact, returning whether there was one.
///
/// # Errors
///
/// Returns [`MsError::Io`] if the file exists but cannot be removed.
pub fn remove(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "artifact removed");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MsError::io(path, e)),
    }
}

/// Service keys of the artifact at `path`, in file order.
///
/// # Errors
///
/// Returns [`MsError::DescriptorLoad`] if the file is missing or is not a
/// composition.
pub fn service_keys(path: &Path) -> Result<Vec<String>> {
    let merged = CompositionDescriptor::load(&path.display().to_string(), path)?;
    Ok(merged.service_keys().map(str::to_string).collect())
}
