use thiserror::Error;

use crate::backend::ChatBackendError;

/// Errors from blob store operations.
///
/// A missing key is NOT an error: `get` signals absence with `None` so
/// callers can tell "new session" apart from "store degraded".
#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("write precondition failed for '{key}'")]
    PreconditionFailed { key: String },

    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    #[error("stored document at '{key}' is malformed: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from submitting a chat turn.
///
/// Every variant aborts the whole turn; partial side effects (attachment
/// blobs persisted before the failure) are not rolled back.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    #[error(transparent)]
    Backend(#[from] ChatBackendError),

    #[error(transparent)]
    Storage(#[from] BlobStoreError),
}
