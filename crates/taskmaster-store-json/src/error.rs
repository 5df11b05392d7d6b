//! Error types for JSON store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during `JsonFileStore` operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the task file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize tasks to JSON.
    #[error("Failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Atomic replacement of the task file failed.
    #[error("Failed to replace {path}: {source}")]
    Persist {
        /// Target file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
