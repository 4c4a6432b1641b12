use thiserror::Error;

/// Errors from transformer pipeline operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipeError {
    /// Checksum verification failed on read: the stored bytes do not match
    /// the digest recorded at write time. The data may be corrupted; this
    /// is never retried automatically.
    #[error("integrity failure: checksum mismatch: expected {expected}, computed {computed}")]
    Integrity { expected: String, computed: String },

    /// The metadata carries no stored checksum to verify against.
    #[error("integrity failure: no stored checksum in metadata")]
    MissingChecksum,
}

/// Result alias for pipeline operations.
pub type PipeResult<T> = Result<T, PipeError>;
