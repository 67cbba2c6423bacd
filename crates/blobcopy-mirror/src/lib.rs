//! Mirror engine for blobcopy.
//!
//! Copies every object of a source [`BlobStore`](blobcopy_store::BlobStore)
//! into a destination, skipping objects whose destination content hash
//! already matches. Optional pieces:
//!
//! - a staging store, used to obtain content hashes from backends that do
//!   not report them ([`StagingCoordinator`]);
//! - deterministic encryption or decryption of content and key names
//!   ([`blobcopy_crypto::Transform`]);
//! - a safety marker that detects a destination written with another key
//!   ([`SafetyGuard`]).
//!
//! Per-object failures go to an [`ErrorCollector`] and never stop a run.

pub mod collector;
pub mod copy;
pub mod engine;
pub mod error;
pub mod options;
pub mod report;
pub mod safety;
pub mod staging;

#[cfg(test)]
mod testing;

pub use collector::ErrorCollector;
pub use copy::copy_object;
pub use engine::MirrorEngine;
pub use error::{MirrorError, MirrorResult, ObjectOp};
pub use options::{CipherMode, MirrorOptions, SafetyPolicy, DEFAULT_STAGING_URL, PASSWORD_ENV};
pub use report::MirrorReport;
pub use safety::{SafetyGuard, SafetyMarker, SafetyOutcome, MARKER_PREFIX};
pub use staging::{StagedObject, StagingCoordinator};
