use crate::codec::{decrypt, decrypt_key_name, encrypt, encrypt_key_name};
use crate::error::CryptoResult;
use crate::key::EncryptionKey;

/// The content and key-name transform applied while copying an object.
///
/// A run either encrypts, decrypts, or passes bytes through; never both
/// directions at once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Transform {
    /// Copy bytes and names unchanged.
    #[default]
    Identity,
    /// Encrypt content; names become `base64url(encrypt(name))`.
    Encrypt(EncryptionKey),
    /// Decrypt content; names become `decrypt(base64url_decode(name))`.
    Decrypt(EncryptionKey),
}

impl Transform {
    /// Build a transform from optional encryption and decryption keys.
    ///
    /// Returns `None` if both keys are supplied.
    pub fn from_keys(
        encrypt: Option<EncryptionKey>,
        decrypt: Option<EncryptionKey>,
    ) -> Option<Self> {
        match (encrypt, decrypt) {
            (None, None) => Some(Self::Identity),
            (Some(key), None) => Some(Self::Encrypt(key)),
            (None, Some(key)) => Some(Self::Decrypt(key)),
            (Some(_), Some(_)) => None,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    /// The key in use, if any.
    pub fn key(&self) -> Option<&EncryptionKey> {
        match self {
            Self::Identity => None,
            Self::Encrypt(key) | Self::Decrypt(key) => Some(key),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Encrypt(_) => "encrypt",
            Self::Decrypt(_) => "decrypt",
        }
    }

    /// Transform object content.
    pub fn apply_content(&self, data: Vec<u8>) -> CryptoResult<Vec<u8>> {
        match self {
            Self::Identity => Ok(data),
            Self::Encrypt(key) => encrypt(&data, key),
            Self::Decrypt(key) => decrypt(&data, key),
        }
    }

    /// Transform an object key.
    pub fn apply_key(&self, name: &str) -> CryptoResult<String> {
        match self {
            Self::Identity => Ok(name.to_string()),
            Self::Encrypt(key) => encrypt_key_name(name.as_bytes(), key),
            Self::Decrypt(key) => decrypt_key_name(name, key),
        }
    }

    /// The transform that undoes this one.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Identity => Self::Identity,
            Self::Encrypt(key) => Self::Decrypt(key.clone()),
            Self::Decrypt(key) => Self::Encrypt(key.clone()),
        }
    }
}
