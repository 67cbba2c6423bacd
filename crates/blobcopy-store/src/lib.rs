//! Blob storage abstraction for blobcopy.
//!
//! A [`BlobStore`] is a flat, named object namespace: list it, look up an
//! object's size and content hash, read it, write it, delete it. The mirror
//! engine only ever talks to this trait.
//!
//! # Backends
//!
//! - [`InMemoryBlobStore`] -- `mem://`, used for tests and as scratch space
//! - [`FileBlobStore`] -- a local directory, `file:///path` or a bare path
//!
//! [`open_store`] picks a backend from a URL.

pub mod error;
pub mod file;
pub mod memory;
pub mod object;
pub mod open;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;
pub use object::{ContentHash, ObjectAttributes, ObjectRef, CONTENT_HASH_LEN};
pub use open::open_store;
pub use traits::{BlobReader, BlobStore, BlobWriter, ObjectListing};
