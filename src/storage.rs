//! Object storage for uploaded task files.
//!
//! The roster only tracks file names and URLs; the bytes live in an object
//! store. The store is a collaborator the service calls after the relational
//! side of a delete has committed.

use anyhow::{Result, bail};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Deletes stored objects.
pub trait ObjectStore: Send + Sync {
    /// Delete one stored object by name.
    fn delete(&self, name: &str) -> Result<()>;

    /// Delete every stored object.
    fn delete_all(&self) -> Result<()>;
}

/// Object store backed by a local media directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object name to a path inside the media directory.
    /// Names that would escape it are rejected.
    fn object_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let plain = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            bail!("Invalid object name: {:?}", name);
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for LocalObjectStore {
    fn delete(&self, name: &str) -> Result<()> {
        let path = self.object_path(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted stored object");
                Ok(())
            }
            // Already gone is what the caller wanted.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_all(&self) -> Result<()> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0usize;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(&path)?;
            } else {
                std::fs::remove_file(&path)?;
            }
            removed += 1;
        }

        debug!(root = %self.root.display(), removed, "Deleted all stored objects");
        Ok(())
    }
}
