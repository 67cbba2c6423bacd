use std::sync::Arc;

use blobcopy_crypto::Transform;
use blobcopy_store::{BlobStore, ObjectAttributes};
use tracing::{info, warn, Span};

use crate::copy::copy_object;
use crate::error::{MirrorError, MirrorResult, ObjectOp};

/// Copies source objects into a scratch store so the scratch backend
/// computes their content hash, and deletes them again.
///
/// The staged copy is already transformed: it carries the destination key
/// and the destination bytes.
pub struct StagingCoordinator {
    store: Arc<dyn BlobStore>,
    span: Span,
}

/// A staged object that must be passed to [`StagingCoordinator::release`]
/// before the iteration that created it ends.
#[must_use = "staged objects must be released"]
pub struct StagedObject {
    source_key: String,
    key: String,
    ordinal: u64,
    released: bool,
    span: Span,
}

impl StagedObject {
    /// Key of the staged copy (the transformed key).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key of the object in the source store.
    pub fn source_key(&self) -> &str {
        &self.source_key
    }
}

impl Drop for StagedObject {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                parent: &self.span,
                ordinal = self.ordinal,
                key = %self.source_key,
                staged = %self.key,
                "staged object dropped without cleanup"
            );
        }
    }
}

impl StagingCoordinator {
    pub fn new(store: Arc<dyn BlobStore>, span: Span) -> Self {
        Self { store, span }
    }

    /// The scratch store.
    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    /// Copy `key` from `source` into staging under its transformed name.
    pub async fn stage(
        &self,
        ordinal: u64,
        source: &dyn BlobStore,
        key: &str,
        transform: &Transform,
    ) -> MirrorResult<StagedObject> {
        info!(parent: &self.span, ordinal, key, "loading to staging store");
        let staged_key = transform
            .apply_key(key)
            .map_err(|e| MirrorError::object(key, ObjectOp::TransformKey, e))?;
        copy_object(source, key, self.store.as_ref(), &staged_key, transform)
            .await
            .map_err(|e| MirrorError::object(key, ObjectOp::Stage, e))?;
        Ok(StagedObject {
            source_key: key.to_string(),
            key: staged_key,
            ordinal,
            released: false,
            span: self.span.clone(),
        })
    }

    /// Attributes of the staged copy, including its content hash.
    pub async fn attributes(&self, staged: &StagedObject) -> MirrorResult<ObjectAttributes> {
        self.store
            .attributes(&staged.key)
            .await
            .map_err(|e| MirrorError::object(&staged.source_key, ObjectOp::StagedAttributes, e))
    }

    /// Delete the staged copy.
    pub async fn release(&self, mut staged: StagedObject) -> MirrorResult<()> {
        staged.released = true;
        info!(
            parent: &self.span,
            ordinal = staged.ordinal,
            key = %staged.source_key,
            "deleting from staging store"
        );
        self.store
            .delete(&staged.key)
            .await
            .map_err(|e| MirrorError::object(&staged.source_key, ObjectOp::Cleanup, e))
    }
}
