//! Error types for archive persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while saving an archive.
///
/// Both variants are per-item: the save stage logs them and moves on.
#[derive(Debug, Error)]
pub enum SaveError {
    /// A file with the derived name already exists; it is left untouched.
    #[error("refusing to overwrite existing file {path}")]
    Conflict {
        /// The existing file.
        path: PathBuf,
    },

    /// File system error while creating, writing, or indexing.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl SaveError {
    /// Creates a conflict error.
    pub fn conflict(path: impl Into<PathBuf>) -> Self {
        Self::Conflict { path: path.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for [`SaveError::Conflict`].
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
