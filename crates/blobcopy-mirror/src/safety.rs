//! Safety markers.
//!
//! A marker is a synthetic object whose name and content are both pure
//! functions of the encryption key. Finding it, byte for byte, certifies
//! that the store was previously written with the same key; mirroring into
//! an encrypted destination with a different password would otherwise mix
//! two unreadable key spaces.

use blobcopy_crypto::{encrypt, encrypt_key_name, CryptoResult, EncryptionKey};
use blobcopy_store::{BlobStore, StoreError};
use tracing::{info, warn, Span};

use crate::error::{MirrorError, MirrorResult};
use crate::options::SafetyPolicy;

/// Plaintext prefix of every marker name.
pub const MARKER_PREFIX: &[u8] = b"_blobcopy_safety_";

/// Location and expected content of the marker for one key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafetyMarker {
    name: String,
    content: Vec<u8>,
}

impl SafetyMarker {
    /// Marker for `key`.
    ///
    /// The plaintext name is the prefix followed by the raw MD5 of the key;
    /// the stored name is that encrypted and base64url-encoded, and the
    /// content is the stored name encrypted again.
    pub fn for_key(key: &EncryptionKey) -> CryptoResult<Self> {
        let mut plain_name = MARKER_PREFIX.to_vec();
        plain_name.extend_from_slice(&key.fingerprint());
        let name = encrypt_key_name(&plain_name, key)?;
        let content = encrypt(name.as_bytes(), key)?;
        Ok(Self { name, content })
    }

    /// Stored object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected stored content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Outcome of [`SafetyGuard::gate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SafetyOutcome {
    /// Policy is off; nothing was checked.
    Skipped,
    /// The marker matched.
    Passed,
    /// The marker was missing or foreign and has been written.
    Generated,
}

/// Checks and writes the marker for one key.
pub struct SafetyGuard {
    marker: SafetyMarker,
    span: Span,
}

impl SafetyGuard {
    pub fn new(key: &EncryptionKey, span: Span) -> MirrorResult<Self> {
        Ok(Self {
            marker: SafetyMarker::for_key(key)?,
            span,
        })
    }

    pub fn marker(&self) -> &SafetyMarker {
        &self.marker
    }

    /// Returns `true` if `store` holds this key's marker.
    ///
    /// A missing marker is `Ok(false)`; any other read failure is an error.
    pub async fn check(&self, store: &dyn BlobStore) -> MirrorResult<bool> {
        let stored = match store.read_all(&self.marker.name).await {
            Ok(data) => data,
            Err(StoreError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        Ok(stored == self.marker.content)
    }

    /// Write the marker, replacing whatever is there.
    pub async fn enable(&self, store: &dyn BlobStore) -> MirrorResult<()> {
        store.write_all(&self.marker.name, &self.marker.content).await?;
        Ok(())
    }

    /// Apply `policy` to `store` before a run.
    ///
    /// The marker is only written when the policy is
    /// [`SafetyPolicy::CheckOrGenerate`] and the check failed.
    pub async fn gate(
        &self,
        store: &dyn BlobStore,
        policy: SafetyPolicy,
    ) -> MirrorResult<SafetyOutcome> {
        if policy == SafetyPolicy::Off {
            return Ok(SafetyOutcome::Skipped);
        }
        if self.check(store).await? {
            info!(parent: &self.span, store = %store.describe(), "safety check passed");
            return Ok(SafetyOutcome::Passed);
        }
        warn!(parent: &self.span, store = %store.describe(), "safety check failed");
        if policy != SafetyPolicy::CheckOrGenerate {
            return Err(MirrorError::SafetyCheckFailed);
        }
        info!(parent: &self.span, store = %store.describe(), "generating safety marker");
        self.enable(store).await?;
        Ok(SafetyOutcome::Generated)
    }
}
