use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::Config;
use crate::envelope::LogEnvelope;
use crate::error::LogError;
use crate::file::FileCollector;
use crate::sqlite::SqliteCollector;

/// Durable sink for log envelopes.
///
/// One collector instance is shared by every logger in the process, so
/// implementations must tolerate concurrent `collect` calls. Failures are
/// reported to the caller and never retried here.
#[async_trait]
pub trait LogCollector: Send + Sync + std::fmt::Debug {
    async fn collect(&self, envelope: LogEnvelope) -> Result<(), LogError>;
}

/// In-process sink retaining envelopes in memory.
///
/// Used by tests and by callers that want to inspect what was logged
/// without standing up a durable backend.
#[derive(Debug, Default)]
pub struct MemoryCollector {
    envelopes: Mutex<Vec<LogEnvelope>>,
}

impl MemoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of everything collected so far.
    pub fn envelopes(&self) -> Vec<LogEnvelope> {
        self.lock().clone()
    }

    /// Drain collected envelopes, leaving the sink empty.
    pub fn take(&self) -> Vec<LogEnvelope> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEnvelope>> {
        self.envelopes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LogCollector for MemoryCollector {
    async fn collect(&self, envelope: LogEnvelope) -> Result<(), LogError> {
        self.lock().push(envelope);
        Ok(())
    }
}

/// Emits every envelope as a structured tracing event.
///
/// Development sink; pairs with the JSON subscriber for machine-readable
/// output without any storage backend.
#[derive(Debug)]
pub struct TracingCollector;

#[async_trait]
impl LogCollector for TracingCollector {
    async fn collect(&self, envelope: LogEnvelope) -> Result<(), LogError> {
        let record = serde_json::to_string(&envelope.record)
            .map_err(|e| LogError::Collection(format!("failed to serialize record: {}", e)))?;

        tracing::info!(
            record_id = %envelope.record_id,
            schema = %envelope.schema,
            model = %envelope.model_name,
            sampling_rate = envelope.sampling_rate,
            record = %record,
            "Log envelope collected"
        );
        Ok(())
    }
}

/// Build the collector selected by `collector.backend` in the config.
pub async fn build_collector(config: &Config) -> Result<Arc<dyn LogCollector>, LogError> {
    match config.collector.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryCollector::new())),
        "tracing" => Ok(Arc::new(TracingCollector)),
        "sqlite" => Ok(Arc::new(
            SqliteCollector::connect(
                &config.collector.database_url,
                config.collector.buffer_size,
            )
            .await?,
        )),
        "file" => Ok(Arc::new(FileCollector::new(&config.collector.log_directory)?)),
        other => Err(LogError::Config(format!(
            "unknown collector backend: {}",
            other
        ))),
    }
}
