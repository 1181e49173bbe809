//! Errors raised by the session layer.

use super::partition::PartitionError;
use std::time::Duration;
use thiserror::Error;
use webnest_store::StoreError;

/// Failure of a profile, active-pointer or partition operation.
///
/// Nothing here is retried; callers decide.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("profiles namespace is not a mapping")]
    MalformedNamespace,

    #[error("profile record '{id}' is malformed: {source}")]
    MalformedRecord {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error("failed to clear storage for {partition}: {source}")]
    PartitionClear {
        partition: String,
        #[source]
        source: PartitionError,
    },

    #[error("clearing storage for {partition} timed out after {}s", timeout.as_secs())]
    ClearTimeout { partition: String, timeout: Duration },

    #[error("storage clear worker for {partition} did not complete: {message}")]
    ClearAborted { partition: String, message: String },
}
