use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Length of a [`ContentHash`] in bytes.
pub const CONTENT_HASH_LEN: usize = 16;

/// MD5 digest of an object's stored bytes.
///
/// Used for change detection only. It says nothing about integrity against
/// a deliberate attacker.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; CONTENT_HASH_LEN]);

impl ContentHash {
    /// Digest `data`.
    pub fn compute(data: &[u8]) -> Self {
        Self(Md5::digest(data).into())
    }

    /// Wrap an existing digest.
    pub const fn from_bytes(bytes: [u8; CONTENT_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; CONTENT_HASH_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Size and content hash of a stored object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAttributes {
    /// Size of the stored bytes.
    pub size: u64,
    /// Content hash, if the backend reports one.
    pub content_hash: Option<ContentHash>,
}

impl ObjectAttributes {
    /// Attributes for a blob held fully in memory.
    pub fn for_data(data: &[u8]) -> Self {
        Self {
            size: data.len() as u64,
            content_hash: Some(ContentHash::compute(data)),
        }
    }

    /// Returns `true` when both sides report a content hash and the hashes
    /// are identical.
    ///
    /// An absent hash on either side never matches, so objects from
    /// backends without native hashes are always re-copied.
    pub fn same_content(&self, other: &ObjectAttributes) -> bool {
        match (self.content_hash, other.content_hash) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// One object in one store's namespace, as produced by a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object key.
    pub key: String,
    /// Size of the stored bytes.
    pub size: u64,
    /// Content hash, if the backend reports one in listings.
    pub content_hash: Option<ContentHash>,
}

impl ObjectRef {
    pub fn new(key: impl Into<String>, attributes: ObjectAttributes) -> Self {
        Self {
            key: key.into(),
            size: attributes.size,
            content_hash: attributes.content_hash,
        }
    }

    /// The size and hash of this reference.
    pub fn attributes(&self) -> ObjectAttributes {
        ObjectAttributes {
            size: self.size,
            content_hash: self.content_hash,
        }
    }
}
