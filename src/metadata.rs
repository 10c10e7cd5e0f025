use serde::{Deserialize, Serialize};

use crate::config::LoggingConfig;

/// Identity of the model that produced a logged response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ModelIdentity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl ModelIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn with_version(name: impl Into<String>, version: i64) -> Self {
        Self {
            name: name.into(),
            version: Some(version),
        }
    }
}

/// Structured descriptor attached to every logged exchange.
///
/// Callers supply `model_spec`; `sampling_config` and `saved_model_tags`
/// are always overwritten with the logger's configured values before an
/// envelope is built, so logged metadata reflects the policy actually in
/// effect rather than what the caller believed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LogMetadata {
    pub model_spec: ModelIdentity,
    pub sampling_config: LoggingConfig,
    #[serde(default)]
    pub saved_model_tags: Vec<String>,
}

impl LogMetadata {
    pub fn for_model(model_spec: ModelIdentity) -> Self {
        Self {
            model_spec,
            ..Default::default()
        }
    }
}

/// Enriches caller-supplied metadata with the logger's sampling
/// configuration and model tags.
pub struct LogMetadataBuilder<'a> {
    config: &'a LoggingConfig,
    saved_model_tags: &'a [String],
}

impl<'a> LogMetadataBuilder<'a> {
    pub fn new(config: &'a LoggingConfig, saved_model_tags: &'a [String]) -> Self {
        Self {
            config,
            saved_model_tags,
        }
    }

    /// Keep the caller's `model_spec`, overwrite everything policy-owned.
    pub fn fill(&self, metadata: &LogMetadata) -> LogMetadata {
        LogMetadata {
            model_spec: metadata.model_spec.clone(),
            sampling_config: self.config.clone(),
            saved_model_tags: self.saved_model_tags.to_vec(),
        }
    }
}
