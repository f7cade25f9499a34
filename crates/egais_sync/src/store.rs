//! Local document store.
//!
//! Stores are **opaque byte sinks**: they create directories and write whole
//! files. The directory layout is decided by the engine.

use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem capability used to persist mirrored documents.
///
/// # Invariants
///
/// - `create_dir_all` is idempotent and creates missing parents
/// - `write_file` replaces any previous content at `path`
///
/// # Implementors
///
/// - [`FileStore`] - the real filesystem
/// - [`InMemoryStore`] - for testing
pub trait DocumentStore: Send + Sync {
    /// Creates `dir` and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if a directory cannot be created.
    fn create_dir_all(&self, dir: &Path) -> SyncResult<()>;

    /// Writes `bytes` to `path`, overwriting existing content.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] if the file cannot be written.
    fn write_file(&self, path: &Path, bytes: &[u8]) -> SyncResult<()>;
}

/// Ensures `dest_dir` exists, then writes `bytes` to `dest_dir/filename`.
///
/// Returns the path that was written.
///
/// # Errors
///
/// Returns [`SyncError::Storage`] on directory creation or write failure.
pub fn write_document<S: DocumentStore + ?Sized>(
    store: &S,
    dest_dir: &Path,
    filename: &str,
    bytes: &[u8],
) -> SyncResult<PathBuf> {
    store.create_dir_all(dest_dir)?;
    let path = dest_dir.join(filename);
    store.write_file(&path, bytes)?;
    Ok(path)
}

/// A [`DocumentStore`] on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    /// Creates a filesystem store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for FileStore {
    fn create_dir_all(&self, dir: &Path) -> SyncResult<()> {
        fs::create_dir_all(dir).map_err(|e| SyncError::storage(dir, e))
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> SyncResult<()> {
        fs::write(path, bytes).map_err(|e| SyncError::storage(path, e))
    }
}

/// An in-memory [`DocumentStore`].
///
/// Writing into a directory that was never created fails, the same way the
/// filesystem would.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    dirs: RwLock<BTreeSet<PathBuf>>,
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the content written at `path`.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().get(path).cloned()
    }

    /// Returns all written paths in sorted order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.read().keys().cloned().collect()
    }

    /// Returns true if `dir` was created.
    #[must_use]
    pub fn has_dir(&self, dir: &Path) -> bool {
        self.dirs.read().contains(dir)
    }
}

impl DocumentStore for InMemoryStore {
    fn create_dir_all(&self, dir: &Path) -> SyncResult<()> {
        let mut dirs = self.dirs.write();
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> SyncResult<()> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            if !self.dirs.read().contains(parent) {
                return Err(SyncError::storage(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "parent directory missing"),
                ));
            }
        }
        self.files.write().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn create_dir_all(&self, dir: &Path) -> SyncResult<()> {
        (**self).create_dir_all(dir)
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> SyncResult<()> {
        (**self).write_file(path, bytes)
    }
}
