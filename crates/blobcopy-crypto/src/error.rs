use thiserror::Error;

/// Errors produced by the cipher codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("ciphertext too short: {actual} bytes, need at least {minimum}")]
    Truncated { minimum: usize, actual: usize },

    /// Wrong key, or the ciphertext was modified.
    #[error("authentication failed: wrong key or tampered ciphertext")]
    Authentication,

    #[error("encryption failed")]
    Encryption,

    #[error("invalid base64 key name: {0}")]
    InvalidEncoding(String),

    #[error("decrypted key name is not valid UTF-8")]
    InvalidUtf8,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
