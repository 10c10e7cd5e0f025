use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::collector::LogCollector;
use crate::envelope::LogEnvelope;
use crate::error::LogError;

/// JSON-lines sink: one envelope per line in a daily-rolling file
/// (`request_log.<date>.jsonl` under the configured directory).
#[derive(Debug)]
pub struct FileCollector {
    writer: Mutex<RollingFileAppender>,
}

impl FileCollector {
    pub fn new(directory: &str) -> Result<Self, LogError> {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("request_log")
            .filename_suffix("jsonl")
            .build(directory)
            .map_err(|e| {
                LogError::Config(format!("failed to open log directory {}: {}", directory, e))
            })?;

        Ok(Self {
            writer: Mutex::new(appender),
        })
    }
}

#[async_trait]
impl LogCollector for FileCollector {
    async fn collect(&self, envelope: LogEnvelope) -> Result<(), LogError> {
        let line = serde_json::to_string(&envelope)
            .map_err(|e| LogError::Collection(format!("failed to serialize envelope: {}", e)))?;

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|e| LogError::Collection(format!("failed to write envelope: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{LogMetadata, ModelIdentity};

    #[tokio::test]
    async fn test_envelopes_written_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let collector = FileCollector::new(dir.path().to_str().unwrap()).unwrap();

        let metadata = LogMetadata::for_model(ModelIdentity::new("chat-large"));
        for i in 0..3 {
            let envelope =
                LogEnvelope::new("test", &metadata, serde_json::json!({ "seq": i }));
            collector.collect(envelope).await.unwrap();
        }

        let entry = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .expect("log file created")
            .unwrap();
        let contents = std::fs::read_to_string(entry.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["model_name"], "chat-large");
        assert_eq!(first["record"]["seq"], 0);
    }

    #[test]
    fn test_invalid_directory_is_config_error() {
        let err = FileCollector::new("/dev/null/not-a-dir").unwrap_err();
        assert!(matches!(err, LogError::Config(_)));
    }
}
