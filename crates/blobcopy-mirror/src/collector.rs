use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, Span};

use crate::error::MirrorError;

/// Background sink for per-object errors.
///
/// The drain task logs each error and counts it. The channel holds a single
/// slot, so a burst of failures makes [`send`](Self::send) wait for the drain
/// loop and errors are logged in the order they happened.
pub struct ErrorCollector {
    sender: mpsc::Sender<MirrorError>,
    drain: JoinHandle<u64>,
    undelivered: AtomicU64,
    span: Span,
}

impl ErrorCollector {
    /// Spawn the drain loop on the current runtime.
    pub fn start(span: Span) -> Self {
        let (sender, mut receiver) = mpsc::channel::<MirrorError>(1);
        let drain_span = span.clone();
        let drain = tokio::spawn(async move {
            let mut count = 0u64;
            while let Some(err) = receiver.recv().await {
                count += 1;
                error!(parent: &drain_span, "{err}");
            }
            count
        });
        Self {
            sender,
            drain,
            undelivered: AtomicU64::new(0),
            span,
        }
    }

    /// Hand an error to the drain loop.
    pub async fn send(&self, err: MirrorError) {
        if let Err(mpsc::error::SendError(err)) = self.sender.send(err).await {
            // The drain task is gone; log here so the error is still counted.
            self.undelivered.fetch_add(1, Ordering::Relaxed);
            error!(parent: &self.span, "{err}");
        }
    }

    /// Close the sink and wait until every error sent so far is drained.
    /// Returns the total number of errors received.
    pub async fn stop(self) -> u64 {
        let ErrorCollector {
            sender,
            drain,
            undelivered,
            span,
        } = self;
        drop(sender);
        let drained = match drain.await {
            Ok(count) => count,
            Err(e) => {
                error!(parent: &span, error = %e, "error collector task failed");
                0
            }
        };
        drained + undelivered.into_inner()
    }
}
