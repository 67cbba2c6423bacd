/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The key cannot be mapped onto this backend's namespace.
    #[error("invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The store URL names a backend this build does not provide.
    #[error("unsupported store backend: {0}")]
    UnsupportedBackend(String),

    /// The store URL could not be parsed.
    #[error("invalid store url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if this error means the object is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Map an I/O error for `key`, turning `ErrorKind::NotFound` into
    /// [`StoreError::NotFound`].
    pub fn from_io(key: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(key.to_string())
        } else {
            Self::Io(err)
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
