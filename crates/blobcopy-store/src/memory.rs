use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectAttributes, ObjectRef};
use crate::traits::{BlobReader, BlobStore, BlobWriter, ObjectListing};

#[derive(Clone)]
struct StoredBlob {
    data: Bytes,
    attributes: ObjectAttributes,
}

type BlobMap = Arc<RwLock<BTreeMap<String, StoredBlob>>>;

/// In-memory blob store, opened with `mem://`.
///
/// Content hashes are computed on write, so this store always reports
/// them. Listing order is lexicographic by key.
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: BlobMap,
}

impl InMemoryBlobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of every key in the store.
    pub fn keys(&self) -> Vec<String> {
        self.blobs.read().expect("lock poisoned").keys().cloned().collect()
    }

    /// Insert an object directly, bypassing the writer.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        let data = data.into();
        let attributes = ObjectAttributes::for_data(&data);
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(key.into(), StoredBlob { data, attributes });
    }

    /// Fetch an object's bytes directly.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.blobs
            .read()
            .expect("lock poisoned")
            .get(key)
            .map(|blob| blob.data.clone())
    }

    fn lookup(&self, key: &str) -> StoreResult<StoredBlob> {
        self.blobs
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn describe(&self) -> String {
        "mem://".to_string()
    }

    fn list(&self) -> ObjectListing<'_> {
        // Snapshot the namespace when iteration begins.
        let listing = stream::once(async move {
            let map = self.blobs.read().expect("lock poisoned");
            map.iter()
                .map(|(key, blob)| Ok(ObjectRef::new(key.clone(), blob.attributes)))
                .collect::<Vec<_>>()
        });
        listing.flat_map(stream::iter).boxed()
    }

    async fn attributes(&self, key: &str) -> StoreResult<ObjectAttributes> {
        Ok(self.lookup(key)?.attributes)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.blobs.read().expect("lock poisoned").contains_key(key))
    }

    async fn new_reader(&self, key: &str) -> StoreResult<BlobReader> {
        let blob = self.lookup(key)?;
        Ok(Box::pin(Cursor::new(blob.data)))
    }

    async fn new_writer(&self, key: &str) -> StoreResult<Box<dyn BlobWriter>> {
        Ok(Box::new(MemoryWriter {
            blobs: Arc::clone(&self.blobs),
            key: key.to_string(),
            buf: Vec::new(),
        }))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.blobs
            .write()
            .expect("lock poisoned")
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

struct MemoryWriter {
    blobs: BlobMap,
    key: String,
    buf: Vec<u8>,
}

#[async_trait]
impl BlobWriter for MemoryWriter {
    async fn write(&mut self, buf: &[u8]) -> StoreResult<()> {
        self.buf.extend_from_slice(buf);
        Ok(())
    }

    async fn close(self: Box<Self>) -> StoreResult<u64> {
        let MemoryWriter { blobs, key, buf } = *self;
        let attributes = ObjectAttributes::for_data(&buf);
        blobs.write().expect("lock poisoned").insert(
            key,
            StoredBlob {
                data: Bytes::from(buf),
                attributes,
            },
        );
        Ok(attributes.size)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("object_count", &self.len())
            .finish()
    }
}
