use serde::{Deserialize, Serialize};

use crate::envelope::{EnvelopeBuilder, LogEnvelope, StreamEnvelopeBuilder};
use crate::error::LogError;
use crate::metadata::LogMetadata;

/// Chat Completion Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Whether to stream responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// User identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat Completion Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One SSE chunk of a streaming chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChatDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Envelope construction for the chat completions schema pair.
pub struct ChatEnvelopeBuilder;

impl EnvelopeBuilder for ChatEnvelopeBuilder {
    type Request = ChatCompletionRequest;
    type Response = ChatCompletionResponse;

    fn schema(&self) -> &str {
        "chat.completions"
    }

    fn create_log_message(
        &self,
        request: &ChatCompletionRequest,
        response: &ChatCompletionResponse,
        metadata: &LogMetadata,
    ) -> Result<LogEnvelope, LogError> {
        let record = serde_json::json!({
            "request": serde_json::to_value(request)?,
            "response": serde_json::to_value(response)?,
            "metadata": serde_json::to_value(metadata)?,
        });
        Ok(LogEnvelope::new(self.schema(), metadata, record))
    }
}

/// Per-chunk envelope construction for streaming chat completions.
pub struct ChatStreamEnvelopeBuilder;

impl StreamEnvelopeBuilder for ChatStreamEnvelopeBuilder {
    type Item = ChatCompletionChunk;

    fn create_log_message(
        &self,
        metadata: &LogMetadata,
        item: &ChatCompletionChunk,
    ) -> Result<LogEnvelope, LogError> {
        let record = serde_json::json!({
            "chunk": serde_json::to_value(item)?,
            "metadata": serde_json::to_value(metadata)?,
        });
        Ok(LogEnvelope::new("chat.completions.chunk", metadata, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use crate::metadata::ModelIdentity;

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "chat-large".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            max_tokens: Some(128),
            temperature: None,
            stream: None,
            user: None,
        }
    }

    fn response() -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: "cmpl-123".to_string(),
            model: "chat-large".to_string(),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: "Hi there".to_string(),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(TokenUsage {
                prompt_tokens: 4,
                completion_tokens: 3,
                total_tokens: 7,
            }),
        }
    }

    fn metadata() -> LogMetadata {
        LogMetadata {
            model_spec: ModelIdentity::with_version("chat-large", 10),
            sampling_config: LoggingConfig { sampling_rate: 1.0 },
            saved_model_tags: vec!["serve".to_string()],
        }
    }

    #[test]
    fn test_chat_envelope_captures_exchange() {
        let envelope = ChatEnvelopeBuilder
            .create_log_message(&request(), &response(), &metadata())
            .unwrap();

        assert_eq!(envelope.schema, "chat.completions");
        assert_eq!(envelope.model_name, "chat-large");
        assert_eq!(envelope.model_version, Some(10));
        assert_eq!(envelope.record["request"]["messages"][0]["content"], "Hello");
        assert_eq!(
            envelope.record["response"]["choices"][0]["message"]["content"],
            "Hi there"
        );
        assert_eq!(envelope.record["metadata"]["sampling_config"]["sampling_rate"], 1.0);
    }

    #[test]
    fn test_chunk_envelope() {
        let chunk = ChatCompletionChunk {
            id: "cmpl-123".to_string(),
            model: "chat-large".to_string(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChatDelta {
                    role: None,
                    content: Some("Hi".to_string()),
                },
                finish_reason: None,
            }],
        };

        let envelope = ChatStreamEnvelopeBuilder
            .create_log_message(&metadata(), &chunk)
            .unwrap();

        assert_eq!(envelope.schema, "chat.completions.chunk");
        assert_eq!(envelope.record["chunk"]["choices"][0]["delta"]["content"], "Hi");
    }

    #[test]
    fn test_request_serde_round_trip() {
        let json = serde_json::to_value(request()).unwrap();
        // Unset options are omitted entirely
        assert!(json.get("temperature").is_none());
        let back: ChatCompletionRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back.messages[0].content, "Hello");
    }
}
