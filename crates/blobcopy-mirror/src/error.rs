use std::fmt;

use blobcopy_crypto::CryptoError;
use blobcopy_store::StoreError;
use thiserror::Error;

/// The per-object step that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectOp {
    SourceAttributes,
    TransformKey,
    Stage,
    StagedAttributes,
    Cleanup,
    CheckDestination,
    DestinationAttributes,
    Copy,
}

impl fmt::Display for ObjectOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SourceAttributes => "unable to get attributes",
            Self::TransformKey => "unable to transform key",
            Self::Stage => "error copying object to staging store",
            Self::StagedAttributes => "unable to get attributes of staged copy",
            Self::Cleanup => "error deleting from staging store",
            Self::CheckDestination => "error checking if object exists in destination",
            Self::DestinationAttributes => "error getting attributes in destination",
            Self::Copy => "error copying object to destination",
        };
        f.write_str(label)
    }
}

/// Errors from the mirror engine and its collaborators.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The source listing yielded an error instead of an object.
    #[error("error iterating source: {0}")]
    Listing(#[source] StoreError),

    /// A step failed for one object; the run continues.
    #[error("{op} for {key}: {source}")]
    Object {
        key: String,
        op: ObjectOp,
        #[source]
        source: Box<MirrorError>,
    },

    /// The destination carries no marker for this key.
    #[error("safety check failed: destination has no marker for this encryption key")]
    SafetyCheckFailed,

    /// A safety marker needs an encryption or decryption key.
    #[error("safety markers require an encryption key")]
    SafetyWithoutKey,
}

impl MirrorError {
    /// Wrap `source` with the key and step it failed on.
    pub fn object(key: &str, op: ObjectOp, source: impl Into<MirrorError>) -> Self {
        Self::Object {
            key: key.to_string(),
            op,
            source: Box::new(source.into()),
        }
    }

    /// The failing step, for per-object errors.
    pub fn op(&self) -> Option<ObjectOp> {
        match self {
            Self::Object { op, .. } => Some(*op),
            _ => None,
        }
    }
}

/// Result alias for mirror operations.
pub type MirrorResult<T> = Result<T, MirrorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_errors_carry_key_and_step() {
        let err = MirrorError::object(
            "photos/cat.jpg",
            ObjectOp::Copy,
            StoreError::NotFound("photos/cat.jpg".into()),
        );
        assert_eq!(err.op(), Some(ObjectOp::Copy));
        assert_eq!(
            err.to_string(),
            "error copying object to destination for photos/cat.jpg: \
             store error: object not found: photos/cat.jpg"
        );
    }

    #[test]
    fn crypto_errors_convert() {
        let err: MirrorError = CryptoError::Authentication.into();
        assert!(matches!(err, MirrorError::Crypto(CryptoError::Authentication)));
        assert_eq!(err.op(), None);
    }
}
