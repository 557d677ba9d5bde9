//! Storage locations.
//!
//! A [`StorageLocation`] is an opaque handle to where index data lives. The
//! in-memory variant wraps a shared [`RamDirectory`]: clones of the same
//! location see the same data, while two calls to
//! [`StorageLocation::in_memory`] produce two unrelated stores.

use std::fmt;
use std::path::{Path, PathBuf};

use tantivy::directory::{Directory, MmapDirectory, RamDirectory};
use tantivy::Index;

use crate::error::{Error, Result};

/// Where an index (or a taxonomy) keeps its data.
#[derive(Clone)]
pub enum StorageLocation {
    /// Process-local, non-persistent storage.
    Memory(RamDirectory),
    /// Memory-mapped directory on disk; created on first open if missing.
    Path(PathBuf),
}

impl StorageLocation {
    /// A fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::Memory(RamDirectory::create())
    }

    /// A persistent store rooted at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Returns `true` for in-memory stores.
    pub fn is_in_memory(&self) -> bool {
        matches!(self, Self::Memory(_))
    }

    /// The on-disk path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Memory(_) => None,
            Self::Path(path) => Some(path),
        }
    }

    /// Open (creating if necessary) the directory behind this location.
    ///
    /// Fails with [`Error::StorageUnavailable`] when the directory cannot be
    /// created or mapped.
    pub fn open_directory(&self) -> Result<Box<dyn Directory>> {
        match self {
            Self::Memory(dir) => Ok(Box::new(dir.clone())),
            Self::Path(path) => {
                std::fs::create_dir_all(path)
                    .map_err(|e| Error::storage(self.describe(), e.to_string()))?;
                let dir = MmapDirectory::open(path)
                    .map_err(|e| Error::storage(self.describe(), e.to_string()))?;
                Ok(Box::new(dir))
            }
        }
    }

    /// Whether an index has already been committed at this location.
    pub fn contains_index(&self) -> Result<bool> {
        let dir = self.open_directory()?;
        Index::exists(&*dir).map_err(|e| Error::storage(self.describe(), e.to_string()))
    }

    /// Short description used in logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "memory".to_string(),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

impl fmt::Debug for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(_) => f.write_str("StorageLocation::Memory"),
            Self::Path(path) => f.debug_tuple("StorageLocation::Path").field(path).finish(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
