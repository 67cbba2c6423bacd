//! Store wrapper that records calls and injects failures.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blobcopy_store::{
    BlobReader, BlobStore, BlobWriter, InMemoryBlobStore, ObjectAttributes, ObjectListing,
    StoreError, StoreResult,
};
use futures::stream::{self, StreamExt};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    List,
    Attributes(String),
    Exists(String),
    Read(String),
    Write(String),
    Delete(String),
}

impl Call {
    fn key(&self) -> Option<&str> {
        match self {
            Self::List => None,
            Self::Attributes(k)
            | Self::Exists(k)
            | Self::Read(k)
            | Self::Write(k)
            | Self::Delete(k) => Some(k),
        }
    }
}

#[derive(Clone)]
pub struct RecordingStore {
    inner: InMemoryBlobStore,
    calls: Arc<Mutex<Vec<Call>>>,
    failures: Vec<Call>,
    listing_error_after: Option<usize>,
}

impl RecordingStore {
    pub fn new(inner: InMemoryBlobStore) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Vec::new(),
            listing_error_after: None,
        }
    }

    /// Fail whenever `call` is made.
    pub fn failing(mut self, call: Call) -> Self {
        self.failures.push(call);
        self
    }

    /// Yield one listing error after `n` objects.
    pub fn with_listing_error_after(mut self, n: usize) -> Self {
        self.listing_error_after = Some(n);
        self
    }

    pub fn inner(&self) -> &InMemoryBlobStore {
        &self.inner
    }

    pub fn calls_for(&self, key: &str) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.key() == Some(key))
            .cloned()
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) -> StoreResult<()> {
        let fail = self.failures.contains(&call);
        self.calls.lock().unwrap().push(call);
        if fail {
            Err(StoreError::Io(std::io::Error::other("injected failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlobStore for RecordingStore {
    fn describe(&self) -> String {
        format!("recording+{}", self.inner.describe())
    }

    fn list(&self) -> ObjectListing<'_> {
        let _ = self.record(Call::List);
        let listing = self.inner.list();
        let Some(n) = self.listing_error_after else {
            return listing;
        };
        stream::once(async move {
            let mut items: Vec<_> = listing.collect().await;
            let at = n.min(items.len());
            items.insert(
                at,
                Err(StoreError::Io(std::io::Error::other("injected listing failure"))),
            );
            items
        })
        .flat_map(stream::iter)
        .boxed()
    }

    async fn attributes(&self, key: &str) -> StoreResult<ObjectAttributes> {
        self.record(Call::Attributes(key.into()))?;
        self.inner.attributes(key).await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.record(Call::Exists(key.into()))?;
        self.inner.exists(key).await
    }

    async fn new_reader(&self, key: &str) -> StoreResult<BlobReader> {
        self.record(Call::Read(key.into()))?;
        self.inner.new_reader(key).await
    }

    async fn new_writer(&self, key: &str) -> StoreResult<Box<dyn BlobWriter>> {
        self.record(Call::Write(key.into()))?;
        self.inner.new_writer(key).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.record(Call::Delete(key.into()))?;
        self.inner.delete(key).await
    }
}
