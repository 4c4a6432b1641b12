use lode_types::{BoxId, RevisionId};

/// Errors from storage backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested revision was not found.
    #[error("revision not found: {box_id}@{revision}")]
    NotFound {
        box_id: BoxId,
        revision: RevisionId,
    },

    /// The box has no revisions (latest-pointer lookup on an unknown box).
    #[error("box not found: {0}")]
    BoxNotFound(BoxId),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is malformed or inconsistent with its manifest.
    #[error("corrupt artifact {box_id}@{revision}: {reason}")]
    CorruptArtifact {
        box_id: BoxId,
        revision: RevisionId,
        reason: String,
    },

    /// Attempted to store under the null revision id.
    #[error("cannot store artifact with null revision id")]
    NullRevisionId,
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
