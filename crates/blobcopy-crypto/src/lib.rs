//! Cipher codec for blobcopy.
//!
//! Deterministic AES-256-GCM over object content and object key names,
//! keyed by a password-derived [`EncryptionKey`]. See [`codec`] for the
//! nonce construction and why it is deterministic.

pub mod codec;
pub mod error;
pub mod key;
pub mod transform;

pub use codec::{decrypt, decrypt_key_name, encrypt, encrypt_key_name, NONCE_LEN, TAG_LEN};
pub use error::{CryptoError, CryptoResult};
pub use key::{EncryptionKey, KEY_LEN};
pub use transform::Transform;
