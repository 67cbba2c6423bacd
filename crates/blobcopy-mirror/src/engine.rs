use std::sync::Arc;
use std::time::Instant;

use blobcopy_crypto::Transform;
use blobcopy_store::{BlobStore, ObjectAttributes, ObjectRef};
use chrono::Utc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Span};

use crate::collector::ErrorCollector;
use crate::copy::copy_object;
use crate::error::{MirrorError, MirrorResult, ObjectOp};
use crate::report::MirrorReport;
use crate::safety::SafetyMarker;
use crate::staging::StagingCoordinator;

/// Terminal state of one retained object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Copied { bytes: u64 },
    Skipped,
}

/// Mirrors every object of a source store into a destination store.
///
/// Objects are processed one at a time in listing order:
/// `listed -> (staged) -> compared -> copied | skipped | failed`.
/// A destination object is only written when it is absent or its content
/// hash differs from the source's. Failures are per object; the run always
/// reaches the end of the listing.
pub struct MirrorEngine {
    source: Arc<dyn BlobStore>,
    destination: Arc<dyn BlobStore>,
    staging: Option<Arc<dyn BlobStore>>,
    transform: Transform,
    skip: u64,
    cancel: CancellationToken,
    span: Span,
}

impl MirrorEngine {
    pub fn new(source: Arc<dyn BlobStore>, destination: Arc<dyn BlobStore>) -> Self {
        Self {
            source,
            destination,
            staging: None,
            transform: Transform::Identity,
            skip: 0,
            cancel: CancellationToken::new(),
            span: info_span!("mirror"),
        }
    }

    /// Stage every object through `store` before comparing.
    pub fn with_staging(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.staging = Some(store);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Pass over the first `skip` listed objects.
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Log handle for the run and its collaborators.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token observed between objects.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the mirror to the end of the source listing.
    pub async fn mirror(&self) -> MirrorReport {
        let started = Instant::now();
        let mut report = MirrorReport::begin(Utc::now());
        let collector = ErrorCollector::start(self.span.clone());
        let staging = self
            .staging
            .as_ref()
            .map(|store| StagingCoordinator::new(Arc::clone(store), self.span.clone()));
        let marker = self.own_marker();
        let staging_desc = staging
            .as_ref()
            .map(|s| s.store().describe())
            .unwrap_or_else(|| "none".to_string());

        info!(
            parent: &self.span,
            source = %self.source.describe(),
            destination = %self.destination.describe(),
            staging = %staging_desc,
            transform = self.transform.label(),
            skip = self.skip,
            "mirror started"
        );

        let mut listing = self.source.list();
        let mut ordinal = 0u64;
        loop {
            if self.cancel.is_cancelled() {
                warn!(parent: &self.span, ordinal, "mirror cancelled");
                break;
            }
            let Some(item) = listing.next().await else {
                break;
            };
            ordinal += 1;
            report.listed += 1;

            let object = match item {
                Ok(object) => object,
                Err(e) => {
                    collector.send(MirrorError::Listing(e)).await;
                    continue;
                }
            };
            if ordinal <= self.skip {
                report.excluded += 1;
                continue;
            }
            if marker.as_deref() == Some(object.key.as_str()) {
                debug!(parent: &self.span, ordinal, "passing over safety marker");
                report.excluded += 1;
                continue;
            }

            match self
                .process(ordinal, &object, staging.as_ref(), &collector)
                .await
            {
                Ok(Outcome::Copied { bytes }) => {
                    report.copied += 1;
                    report.bytes_copied += bytes;
                }
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => collector.send(e).await,
            }
        }

        report.errors = collector.stop().await;
        report.elapsed = started.elapsed();
        info!(
            parent: &self.span,
            copied = report.copied,
            skipped = report.skipped,
            errors = report.errors,
            "mirror finished"
        );
        report
    }

    /// Name of the safety marker belonging to this run's key. Such an
    /// object in the source is bookkeeping, not data.
    fn own_marker(&self) -> Option<String> {
        let key = self.transform.key()?;
        match SafetyMarker::for_key(key) {
            Ok(marker) => Some(marker.name().to_string()),
            Err(e) => {
                warn!(parent: &self.span, error = %e, "cannot derive safety marker name");
                None
            }
        }
    }

    async fn process(
        &self,
        ordinal: u64,
        object: &ObjectRef,
        staging: Option<&StagingCoordinator>,
        collector: &ErrorCollector,
    ) -> MirrorResult<Outcome> {
        let key = object.key.as_str();
        let source_attrs = self
            .source
            .attributes(key)
            .await
            .map_err(|e| MirrorError::object(key, ObjectOp::SourceAttributes, e))?;

        let Some(staging) = staging else {
            let dest_key = self
                .transform
                .apply_key(key)
                .map_err(|e| MirrorError::object(key, ObjectOp::TransformKey, e))?;
            return self
                .compare_and_copy(
                    ordinal,
                    key,
                    self.source.as_ref(),
                    key,
                    &source_attrs,
                    &dest_key,
                    &self.transform,
                )
                .await;
        };

        let staged = staging
            .stage(ordinal, self.source.as_ref(), key, &self.transform)
            .await?;
        // The staged copy already holds destination bytes under the
        // destination key, so it is copied through unchanged.
        let outcome = match staging.attributes(&staged).await {
            Ok(staged_attrs) => {
                self.compare_and_copy(
                    ordinal,
                    key,
                    staging.store(),
                    staged.key(),
                    &staged_attrs,
                    staged.key(),
                    &Transform::Identity,
                )
                .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = staging.release(staged).await {
            collector.send(e).await;
        }
        outcome
    }

    #[allow(clippy::too_many_arguments)]
    async fn compare_and_copy(
        &self,
        ordinal: u64,
        key: &str,
        from: &dyn BlobStore,
        from_key: &str,
        from_attrs: &ObjectAttributes,
        dest_key: &str,
        transform: &Transform,
    ) -> MirrorResult<Outcome> {
        let exists = self
            .destination
            .exists(dest_key)
            .await
            .map_err(|e| MirrorError::object(key, ObjectOp::CheckDestination, e))?;
        if exists {
            let dest_attrs = self
                .destination
                .attributes(dest_key)
                .await
                .map_err(|e| MirrorError::object(key, ObjectOp::DestinationAttributes, e))?;
            if from_attrs.same_content(&dest_attrs) {
                debug!(parent: &self.span, ordinal, key, "content hash matches, skipping");
                return Ok(Outcome::Skipped);
            }
            debug!(parent: &self.span, ordinal, key, "content hash differs");
        }

        info!(
            parent: &self.span,
            ordinal,
            key,
            dest_key,
            size = from_attrs.size,
            "copying to destination"
        );
        let bytes = copy_object(from, from_key, self.destination.as_ref(), dest_key, transform)
            .await
            .map_err(|e| MirrorError::object(key, ObjectOp::Copy, e))?;
        info!(parent: &self.span, ordinal, key, dest_key, size = bytes, "copied to destination");
        Ok(Outcome::Copied { bytes })
    }
}
