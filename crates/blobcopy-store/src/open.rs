use std::sync::Arc;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::file::FileBlobStore;
use crate::memory::InMemoryBlobStore;
use crate::traits::BlobStore;

/// Schemes that name cloud object stores. They are recognised so the error
/// is explicit, but no backend for them ships in this workspace.
const CLOUD_SCHEMES: &[&str] = &["s3", "gs", "azblob"];

/// Open a blob store from a URL.
///
/// - `mem://` opens a fresh, empty in-memory store. Every call returns a
///   distinct namespace.
/// - `file:///abs/path` and bare filesystem paths open a directory.
pub fn open_store(url: &str) -> StoreResult<Arc<dyn BlobStore>> {
    let invalid = |reason: &str| StoreError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let store: Arc<dyn BlobStore> = match url.split_once("://") {
        Some(("mem", _)) => Arc::new(InMemoryBlobStore::new()),
        Some(("file", path)) => {
            if path.is_empty() {
                return Err(invalid("missing directory path"));
            }
            Arc::new(FileBlobStore::open(path)?)
        }
        Some((scheme, _)) if CLOUD_SCHEMES.contains(&scheme) => {
            return Err(StoreError::UnsupportedBackend(scheme.to_string()));
        }
        Some((scheme, _)) => return Err(invalid(&format!("unknown scheme {scheme:?}"))),
        None if url.is_empty() => return Err(invalid("empty url")),
        None => Arc::new(FileBlobStore::open(url)?),
    };
    debug!(url, backend = %store.describe(), "store opened");
    Ok(store)
}
