use thiserror::Error;

/// Errors from value codec operations.
#[derive(Debug, Error)]
pub enum ValueError {
    /// No registered codec matches the value's runtime type. Raised before
    /// any transformer or storage work begins.
    #[error("no value codec matches value of kind '{0}'")]
    UnsupportedValue(&'static str),

    /// A manifest names a codec descriptor that is not registered.
    #[error("unknown value codec descriptor: {0}")]
    UnknownDescriptor(String),

    /// The stored bytes cannot be decoded back to a value.
    #[error("decode error: {0}")]
    Decode(String),

    /// I/O failure while reading or materializing a file value.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for codec operations.
pub type ValueResult<T> = Result<T, ValueError>;
