use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::io::AsyncRead;

use crate::error::StoreResult;
use crate::object::{ObjectAttributes, ObjectRef};

/// Lazy, forward-only listing of a store's namespace.
///
/// Each item is either the next object or the error that interrupted
/// iteration at that point. The stream ends at end-of-namespace.
pub type ObjectListing<'a> = BoxStream<'a, StoreResult<ObjectRef>>;

/// Byte stream over one stored object.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// Byte sink for one object. Nothing is visible in the store until
/// [`BlobWriter::close`] succeeds.
#[async_trait]
pub trait BlobWriter: Send {
    /// Append bytes to the pending object.
    async fn write(&mut self, buf: &[u8]) -> StoreResult<()>;

    /// Finalize the object, creating or overwriting it. Returns the number
    /// of bytes stored.
    async fn close(self: Box<Self>) -> StoreResult<u64>;
}

/// A named object namespace.
///
/// All implementations must satisfy these invariants:
/// - `list` is lazy and terminates at end-of-namespace.
/// - `attributes`, `new_reader` and `delete` fail with
///   [`StoreError::NotFound`](crate::StoreError::NotFound) for absent keys.
/// - `exists` reports absence as `Ok(false)`; only I/O failures are errors.
/// - A writer replaces any existing object under the same key on close.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short description of the backend, used in logs.
    fn describe(&self) -> String;

    /// List every object in the namespace.
    fn list(&self) -> ObjectListing<'_>;

    /// Size and content hash of `key`.
    async fn attributes(&self, key: &str) -> StoreResult<ObjectAttributes>;

    /// Whether `key` is present.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Open `key` for reading.
    async fn new_reader(&self, key: &str) -> StoreResult<BlobReader>;

    /// Open `key` for writing.
    async fn new_writer(&self, key: &str) -> StoreResult<Box<dyn BlobWriter>>;

    /// Remove `key`.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Read the whole object into memory.
    async fn read_all(&self, key: &str) -> StoreResult<Vec<u8>> {
        use tokio::io::AsyncReadExt;

        let mut reader = self.new_reader(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Write `data` as the full content of `key`.
    async fn write_all(&self, key: &str, data: &[u8]) -> StoreResult<u64> {
        let mut writer = self.new_writer(key).await?;
        writer.write(data).await?;
        writer.close().await
    }
}
