use std::io::Write;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectAttributes, ObjectRef};
use crate::traits::{BlobReader, BlobStore, BlobWriter, ObjectListing};

/// Prefix of the scratch files a writer creates before it is closed.
const PENDING_PREFIX: &str = ".blobcopy-pending-";

/// Longest file or directory name most filesystems accept, in bytes.
const MAX_NAME_LEN: usize = 255;

/// Local-directory blob store, opened with `file:///path` or a bare path.
///
/// Keys map to paths relative to the root; `/` separates directories.
/// Content hashes are computed from the file bytes on each attribute
/// lookup, listings do not carry them.
#[derive(Clone, Debug)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Open an existing directory as a store.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        let meta = std::fs::metadata(&root)?;
        if !meta.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            )));
        }
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let invalid = |reason: &str| StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        let relative = Path::new(key);
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    if part.to_string_lossy().starts_with(PENDING_PREFIX) {
                        return Err(invalid("reserved name"));
                    }
                    if part.len() > MAX_NAME_LEN {
                        return Err(invalid("name too long"));
                    }
                }
                _ => return Err(invalid("key must be a relative path without `..`")),
            }
        }
        Ok(self.root.join(relative))
    }

    fn key_for(root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    fn walk(root: PathBuf) -> Vec<StoreResult<ObjectRef>> {
        WalkDir::new(&root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file()
                        || entry.file_name().to_string_lossy().starts_with(PENDING_PREFIX)
                    {
                        return None;
                    }
                    let key = Self::key_for(&root, entry.path())?;
                    let size = match entry.metadata() {
                        Ok(meta) => meta.len(),
                        Err(e) => return Some(Err(StoreError::Io(e.into()))),
                    };
                    Some(Ok(ObjectRef {
                        key,
                        size,
                        content_hash: None,
                    }))
                }
                Err(e) => Some(Err(StoreError::Io(e.into()))),
            })
            .collect()
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }

    fn list(&self) -> ObjectListing<'_> {
        let root = self.root.clone();
        stream::once(async move {
            match tokio::task::spawn_blocking(move || Self::walk(root)).await {
                Ok(entries) => entries,
                Err(e) => vec![Err(StoreError::Io(std::io::Error::other(e)))],
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }

    async fn attributes(&self, key: &str) -> StoreResult<ObjectAttributes> {
        let path = self.path_for(key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| StoreError::from_io(key, e))?;
        Ok(ObjectAttributes::for_data(&data))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn new_reader(&self, key: &str) -> StoreResult<BlobReader> {
        let path = self.path_for(key)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| StoreError::from_io(key, e))?;
        Ok(Box::pin(file))
    }

    async fn new_writer(&self, key: &str) -> StoreResult<Box<dyn BlobWriter>> {
        let path = self.path_for(key)?;
        Ok(Box::new(FileWriter {
            path,
            buf: Vec::new(),
        }))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::from_io(key, e))
    }
}

/// Buffers the object and publishes it with an atomic rename on close.
struct FileWriter {
    path: PathBuf,
    buf: Vec<u8>,
}

#[async_trait]
impl BlobWriter for FileWriter {
    async fn write(&mut self, buf: &[u8]) -> StoreResult<()> {
        self.buf.extend_from_slice(buf);
        Ok(())
    }

    async fn close(self: Box<Self>) -> StoreResult<u64> {
        let FileWriter { path, buf } = *self;
        let size = buf.len() as u64;
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let parent = path.parent().ok_or_else(|| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "object path has no parent directory",
                ))
            })?;
            std::fs::create_dir_all(parent)?;
            let mut pending = tempfile::Builder::new()
                .prefix(PENDING_PREFIX)
                .tempfile_in(parent)?;
            pending.write_all(&buf)?;
            pending.as_file().sync_all()?;
            pending.persist(&path).map_err(|e| StoreError::Io(e.error))?;
            debug!(path = %path.display(), size = buf.len(), "object written");
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ContentHash;
    use futures::TryStreamExt;

    fn temp_store() -> (tempfile::TempDir, FileBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn write_creates_nested_directories() {
        let (dir, store) = temp_store();
        store.write_all("photos/2024/cat.jpg", b"meow").await.unwrap();
        let on_disk = std::fs::read(dir.path().join("photos/2024/cat.jpg")).unwrap();
        assert_eq!(on_disk, b"meow");
    }

    #[tokio::test]
    async fn attributes_hash_file_contents() {
        let (_dir, store) = temp_store();
        store.write_all("a.txt", b"abc").await.unwrap();
        let attrs = store.attributes("a.txt").await.unwrap();
        assert_eq!(attrs.size, 3);
        assert_eq!(attrs.content_hash, Some(ContentHash::compute(b"abc")));
    }

    #[tokio::test]
    async fn listing_uses_slash_keys_in_name_order() {
        let (_dir, store) = temp_store();
        store.write_all("b.txt", b"2").await.unwrap();
        store.write_all("a/z.txt", b"1").await.unwrap();
        store.write_all("c.txt", b"3").await.unwrap();

        let listed: Vec<ObjectRef> = store.list().try_collect().await.unwrap();
        let keys: Vec<&str> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a/z.txt", "b.txt", "c.txt"]);
        assert!(listed.iter().all(|o| o.content_hash.is_none()));
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let (_dir, store) = temp_store();
        assert!(!store.exists("missing").await.unwrap());
        assert!(store.attributes("missing").await.unwrap_err().is_not_found());
        assert!(store.delete("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let (_dir, store) = temp_store();
        store.write_all("x", b"data").await.unwrap();
        assert!(store.exists("x").await.unwrap());
        store.delete("x").await.unwrap();
        assert!(!store.exists("x").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let (_dir, store) = temp_store();
        let err = store.write_all("../outside", b"x").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
        let err = store.exists("/etc/passwd").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn rejects_overlong_names() {
        let (_dir, store) = temp_store();
        let long = "n".repeat(MAX_NAME_LEN + 1);

        let err = store.exists(&long).await.unwrap_err();
        assert!(err.to_string().contains("name too long"), "{err}");
        let err = store
            .write_all(&format!("dir/{long}"), b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));

        let fits = "n".repeat(MAX_NAME_LEN);
        store.write_all(&fits, b"x").await.unwrap();
        assert!(store.exists(&fits).await.unwrap());
    }

    #[test]
    fn open_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        assert!(FileBlobStore::open(&file).is_err());
        assert!(FileBlobStore::open(dir.path().join("absent")).is_err());
    }
}
