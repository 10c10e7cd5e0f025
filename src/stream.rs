use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Weak;

use crate::envelope::StreamEnvelopeBuilder;
use crate::error::LogError;
use crate::logger::LoggerCore;
use crate::metadata::LogMetadata;

/// Per-stream-message logger bound to the `RequestLogger` that spawned it.
///
/// Holds only a weak reference to its parent's state: once the parent's
/// logging scope ends, every subsequent `log_message` becomes a silent
/// no-op. The upgrade on each call is what makes the liveness check
/// race-free: a successful upgrade keeps the parent state alive until
/// the collect completes, so teardown can never slip in between the check
/// and the use.
pub struct StreamLogger<S: StreamEnvelopeBuilder> {
    builder: S,
    metadata: LogMetadata,
    parent: Weak<LoggerCore>,
    messages_logged: AtomicU64,
    detached: AtomicBool,
}

impl<S: StreamEnvelopeBuilder> StreamLogger<S> {
    pub(crate) fn new(builder: S, metadata: LogMetadata, parent: Weak<LoggerCore>) -> Self {
        Self {
            builder,
            metadata,
            parent,
            messages_logged: AtomicU64::new(0),
            detached: AtomicBool::new(false),
        }
    }

    /// Metadata captured when the stream was admitted for logging.
    pub fn metadata(&self) -> &LogMetadata {
        &self.metadata
    }

    /// Number of stream items logged so far.
    pub fn messages_logged(&self) -> u64 {
        self.messages_logged.load(Ordering::Relaxed)
    }

    /// Whether the parent logger has been observed gone. Terminal.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Relaxed)
    }

    /// Log one stream item.
    ///
    /// A gone parent is not an error: the stream's data path keeps running
    /// after its logging scope ends, so the call succeeds with zero side
    /// effects. Hook failures propagate without a collector call; collector
    /// failures propagate verbatim. Each call logs exactly the item
    /// presented to it, with no retry and no re-logging of prior items.
    pub async fn log_message(&self, item: &S::Item) -> Result<(), LogError> {
        let Some(core) = self.parent.upgrade() else {
            if !self.detached.swap(true, Ordering::Relaxed) {
                tracing::debug!(
                    model = %self.metadata.model_spec.name,
                    "Parent request logger dropped; stream logging disabled"
                );
            }
            return Ok(());
        };

        let envelope = self.builder.create_log_message(&self.metadata, item)?;
        core.collector.collect(envelope).await?;

        self.messages_logged.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
