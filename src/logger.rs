use std::sync::Arc;

use crate::collector::LogCollector;
use crate::config::LoggingConfig;
use crate::envelope::{EnvelopeBuilder, StreamEnvelopeBuilder};
use crate::error::LogError;
use crate::metadata::LogMetadata;
use crate::sampling::should_sample;
use crate::stream::StreamLogger;

/// State reachable from stream loggers after their parent is gone.
///
/// Held behind a single `Arc` owned by the `RequestLogger`; stream loggers
/// keep only a `Weak` to it. Dropping the logger drops the sole strong
/// count, which invalidates every child's reference atomically.
pub(crate) struct LoggerCore {
    pub(crate) config: LoggingConfig,
    pub(crate) saved_model_tags: Vec<String>,
    pub(crate) collector: Arc<dyn LogCollector>,
}

/// Orchestrates sampling, metadata enrichment, envelope construction and
/// delegation to the collector for one logging scope.
///
/// One instance per request (or per stream); instances are never shared
/// across concurrent requests and hold no locks of their own. The
/// collector handle is shared process-wide and outlives every logger
/// referencing it.
///
/// Intentionally not `Clone`: stream loggers spawned from this instance
/// become no-ops the moment it is dropped, and a second strong handle
/// would break that contract.
pub struct RequestLogger<B: EnvelopeBuilder> {
    core: Arc<LoggerCore>,
    builder: B,
}

impl<B: EnvelopeBuilder> RequestLogger<B> {
    pub fn new(
        config: LoggingConfig,
        saved_model_tags: Vec<String>,
        collector: Arc<dyn LogCollector>,
        builder: B,
    ) -> Self {
        Self {
            core: Arc::new(LoggerCore {
                config,
                saved_model_tags,
                collector,
            }),
            builder,
        }
    }

    pub fn sampling_rate(&self) -> f64 {
        self.core.config.sampling_rate
    }

    /// Enrich caller metadata with this logger's configuration.
    ///
    /// Delegates to the builder's metadata hook; the default keeps the
    /// caller's `model_spec` and overwrites the policy-owned fields.
    pub fn fill_log_metadata(&self, metadata: &LogMetadata) -> LogMetadata {
        self.builder
            .fill_log_metadata(metadata, &self.core.config, &self.core.saved_model_tags)
    }

    /// Probabilistically log one request/response exchange.
    ///
    /// Unsampled exchanges return `Ok` immediately without building an
    /// envelope or touching the collector. Hook and collector failures
    /// propagate verbatim; at most one collector call happens per
    /// invocation, and a hook failure suppresses it entirely.
    pub async fn log(
        &self,
        request: &B::Request,
        response: &B::Response,
        metadata: &LogMetadata,
    ) -> Result<(), LogError> {
        if !should_sample(self.core.config.sampling_rate) {
            return Ok(());
        }

        let metadata = self.fill_log_metadata(metadata);
        let envelope = self
            .builder
            .create_log_message(request, response, &metadata)?;
        self.core.collector.collect(envelope).await
    }

    /// Start logging a streaming exchange, if sampled.
    ///
    /// The factory runs only when the sampling decision is "log", so an
    /// unsampled stream costs one RNG draw and nothing else. The returned
    /// logger is owned by the caller, typically scoped to the stream's
    /// duration; it degrades to a no-op once this logger is dropped.
    pub fn maybe_start_logging_stream<S, F>(
        &self,
        metadata: &LogMetadata,
        factory: F,
    ) -> Option<StreamLogger<S>>
    where
        S: StreamEnvelopeBuilder,
        F: FnOnce() -> S,
    {
        let metadata = self.fill_log_metadata(metadata);
        if !should_sample(self.core.config.sampling_rate) {
            return None;
        }

        Some(StreamLogger::new(
            factory(),
            metadata,
            Arc::downgrade(&self.core),
        ))
    }
}
