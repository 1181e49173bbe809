//! Typed errors for store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`crate::KeyValueStore`] implementations.
///
/// All variants are returned to the caller as-is; the store never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not hold a valid JSON document.
    #[error("store file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory document could not be serialized.
    #[error("failed to serialize store document: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A dotted path was empty or contained an empty segment.
    #[error("invalid store path '{0}'")]
    InvalidPath(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
