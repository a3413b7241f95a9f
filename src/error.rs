//! Error handling types and utilities.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for docshelf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the registry and the docset layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The path did not hold a usable docset bundle.
    ///
    /// Raised at add time: missing index database, unreadable file, or a
    /// symbol table in neither of the known schemas.
    #[error("invalid docset at {}: {reason}", .path.display())]
    InvalidDocset { path: PathBuf, reason: String },

    /// A lookup referenced a docset that is not loaded.
    #[error("no docset named '{0}' is loaded")]
    DocsetNotFound(String),

    /// A query against an already-open docset store failed.
    #[error("docset database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The registry worker thread has exited; the handle is no longer usable.
    #[error("the registry worker has shut down")]
    WorkerGone,
}
