use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::error::LogError;
use crate::metadata::{LogMetadata, LogMetadataBuilder};

/// Serialized, schema-specific artifact handed to the collector.
///
/// The header fields are denormalized out of the metadata so sinks can
/// index them without parsing `record`; the `record` payload itself is
/// opaque to everything but the schema hook that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEnvelope {
    pub record_id: String,
    /// Schema tag of the request/response pair, e.g. "chat.completions"
    pub schema: String,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<i64>,
    pub sampling_rate: f64,
    pub saved_model_tags: Vec<String>,
    /// Unix milliseconds
    pub logged_at: i64,
    /// Serialized request + response + metadata
    pub record: serde_json::Value,
}

impl LogEnvelope {
    pub fn new(
        schema: impl Into<String>,
        metadata: &LogMetadata,
        record: serde_json::Value,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            schema: schema.into(),
            model_name: metadata.model_spec.name.clone(),
            model_version: metadata.model_spec.version,
            sampling_rate: metadata.sampling_config.sampling_rate,
            saved_model_tags: metadata.saved_model_tags.clone(),
            logged_at: Utc::now().timestamp_millis(),
            record,
        }
    }
}

/// Schema-specific envelope construction for one request/response pair.
///
/// This is the only surface that knows the concrete wire types; the
/// orchestration in `RequestLogger` stays schema-agnostic and different
/// schema pairs are plugged in at logger construction time.
pub trait EnvelopeBuilder: Send + Sync {
    type Request;
    type Response;

    /// Schema tag stamped on produced envelopes
    fn schema(&self) -> &str;

    fn create_log_message(
        &self,
        request: &Self::Request,
        response: &Self::Response,
        metadata: &LogMetadata,
    ) -> Result<LogEnvelope, LogError>;

    /// Metadata enrichment hook.
    ///
    /// The default keeps the caller's `model_spec` and overwrites
    /// `sampling_config` and `saved_model_tags` with the logger's
    /// configured values; schema pairs that need a different metadata
    /// shape override this.
    fn fill_log_metadata(
        &self,
        metadata: &LogMetadata,
        config: &LoggingConfig,
        saved_model_tags: &[String],
    ) -> LogMetadata {
        LogMetadataBuilder::new(config, saved_model_tags).fill(metadata)
    }
}

/// Stream variant of [`EnvelopeBuilder`]: one envelope per stream item.
pub trait StreamEnvelopeBuilder: Send + Sync {
    type Item;

    fn create_log_message(
        &self,
        metadata: &LogMetadata,
        item: &Self::Item,
    ) -> Result<LogEnvelope, LogError>;
}

/// Protocol-agnostic fallback: request and response are raw JSON values,
/// logged as-is. Useful when the exchange has already been reduced to the
/// provider wire format upstream.
pub struct JsonEnvelopeBuilder;

impl EnvelopeBuilder for JsonEnvelopeBuilder {
    type Request = serde_json::Value;
    type Response = serde_json::Value;

    fn schema(&self) -> &str {
        "json"
    }

    fn create_log_message(
        &self,
        request: &serde_json::Value,
        response: &serde_json::Value,
        metadata: &LogMetadata,
    ) -> Result<LogEnvelope, LogError> {
        let record = serde_json::json!({
            "request": request,
            "response": response,
            "metadata": serde_json::to_value(metadata)?,
        });
        Ok(LogEnvelope::new(self.schema(), metadata, record))
    }
}

/// Stream counterpart of [`JsonEnvelopeBuilder`].
pub struct JsonStreamEnvelopeBuilder;

impl StreamEnvelopeBuilder for JsonStreamEnvelopeBuilder {
    type Item = serde_json::Value;

    fn create_log_message(
        &self,
        metadata: &LogMetadata,
        item: &serde_json::Value,
    ) -> Result<LogEnvelope, LogError> {
        let record = serde_json::json!({
            "item": item,
            "metadata": serde_json::to_value(metadata)?,
        });
        Ok(LogEnvelope::new("json.stream", metadata, record))
    }
}
