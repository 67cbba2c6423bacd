//! Deterministic AES-256-GCM.
//!
//! The nonce is the first [`NONCE_LEN`] bytes of `MD5(plaintext)` and is
//! prepended to the sealed output. Encryption is therefore a pure function
//! of `(plaintext, key)`: equal plaintexts give byte-identical ciphertexts,
//! which keeps content hashes comparable across repeated mirror runs.
//! Equal plaintexts are also recognisable as equal to anyone who can see
//! the ciphertexts; that confidentiality loss is accepted.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use md5::{Digest, Md5};

use crate::error::{CryptoError, CryptoResult};
use crate::key::EncryptionKey;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

fn cipher(key: &EncryptionKey) -> CryptoResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::InvalidKeyLength {
        expected: crate::key::KEY_LEN,
        actual: key.as_bytes().len(),
    })
}

/// Nonce derived from the plaintext.
pub fn content_nonce(plaintext: &[u8]) -> [u8; NONCE_LEN] {
    let digest = Md5::digest(plaintext);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest[..NONCE_LEN]);
    nonce
}

/// Seal `plaintext`. Output layout: `nonce || ciphertext || tag`.
pub fn encrypt(plaintext: &[u8], key: &EncryptionKey) -> CryptoResult<Vec<u8>> {
    let nonce = content_nonce(plaintext);
    let sealed = cipher(key)?
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Open data produced by [`encrypt`].
pub fn decrypt(ciphertext: &[u8], key: &EncryptionKey) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Truncated {
            minimum: NONCE_LEN + TAG_LEN,
            actual: ciphertext.len(),
        });
    }
    let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
    cipher(key)?
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Authentication)
}

/// Encrypt an object key and encode it with padded URL-safe base64 so it
/// can be used as an object name.
pub fn encrypt_key_name(name: &[u8], key: &EncryptionKey) -> CryptoResult<String> {
    Ok(URL_SAFE.encode(encrypt(name, key)?))
}

/// Inverse of [`encrypt_key_name`].
pub fn decrypt_key_name(name: &str, key: &EncryptionKey) -> CryptoResult<String> {
    let sealed = URL_SAFE
        .decode(name)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
    let plain = decrypt(&sealed, key)?;
    String::from_utf8(plain).map_err(|_| CryptoError::InvalidUtf8)
}
