//! Error types for notes lookups.

use odb_store::StoreError;
use thiserror::Error;

/// Errors that can occur while walking a notes tree.
#[derive(Debug, Error)]
pub enum NotesError {
    /// The entry named after the commit is not a regular file.
    #[error("note {path} is not a regular file")]
    NotARegularFile { path: String },

    /// A fanout segment exists but is not a directory.
    #[error("notes fanout {path} is not a directory")]
    NotADirectory { path: String },

    /// Failure reading or dereferencing an object.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for notes operations.
pub type Result<T> = std::result::Result<T, NotesError>;
