use std::fmt;

use md5::{Digest, Md5};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of an [`EncryptionKey`] in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Symmetric key used for both content and key-name encryption.
///
/// Derived from an operator password as `MD5(MD5(password)) || MD5(password)`,
/// so the same password always yields the same key. The bytes are wiped
/// on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Derive the key for `password`.
    pub fn from_password(password: &str) -> Self {
        let inner: [u8; 16] = Md5::digest(password.as_bytes()).into();
        let outer: [u8; 16] = Md5::digest(inner).into();

        let mut bytes = [0u8; KEY_LEN];
        bytes[..16].copy_from_slice(&outer);
        bytes[16..].copy_from_slice(&inner);
        Self(bytes)
    }

    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// MD5 of the key bytes. Identifies a key without revealing it.
    pub fn fingerprint(&self) -> [u8; 16] {
        Md5::digest(self.0).into()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}
