//! Filesystem mutations used by the dispatcher.
//!
//! The dispatcher only talks to [`EntryOps`], so batches can be driven against
//! a fake in tests. [`LocalFs`] is the real implementation.

use std::{fs, io, path::Path};

use thiserror::Error;

use super::relocate::{RelocateError, relocate};

/// Cause of a single entry failing inside a batch.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("{0}")]
    Remove(#[source] io::Error),

    #[error("{0}")]
    Relocate(#[source] RelocateError),

    #[error("path has no file name")]
    NoFileName,
}

/// Mutating operations on a single scanned entry.
pub trait EntryOps {
    /// Remove `path`; directories are removed with their contents.
    fn remove_all(&self, path: &Path) -> Result<(), EntryError>;

    /// Move `source` to `destination`.
    fn relocate(&self, source: &Path, destination: &Path) -> Result<(), EntryError>;
}

/// [`EntryOps`] against the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl EntryOps for LocalFs {
    fn remove_all(&self, path: &Path) -> Result<(), EntryError> {
        // Symlinks are removed, never followed.
        let metadata = fs::symlink_metadata(path).map_err(EntryError::Remove)?;
        if metadata.is_dir() {
            fs::remove_dir_all(path).map_err(EntryError::Remove)
        } else {
            fs::remove_file(path).map_err(EntryError::Remove)
        }
    }

    fn relocate(&self, source: &Path, destination: &Path) -> Result<(), EntryError> {
        relocate(source, destination).map_err(EntryError::Relocate)
    }
}
