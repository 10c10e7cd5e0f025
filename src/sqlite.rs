use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tokio::sync::mpsc;

use crate::collector::LogCollector;
use crate::envelope::LogEnvelope;
use crate::error::LogError;

/// Durable sink writing envelopes to SQLite.
///
/// `collect` sends to an MPSC channel; a background task owns the pool and
/// performs the inserts, so callers never block on the database. A full or
/// closed channel surfaces as a `Collection` error.
#[derive(Debug)]
pub struct SqliteCollector {
    tx: mpsc::Sender<LogEnvelope>,
}

impl SqliteCollector {
    /// Connect to the database, run migrations, and spawn the writer task.
    pub async fn connect(database_url: &str, buffer_size: usize) -> Result<Self, LogError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| LogError::Config(format!("invalid database url: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| LogError::Config(format!("migration failed: {}", e)))?;

        Ok(Self::spawn_writer(pool, buffer_size))
    }

    fn spawn_writer(pool: SqlitePool, buffer_size: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<LogEnvelope>(buffer_size);

        // Writer task is panic-guarded: a poisoned write must not take the
        // process down with it.
        tokio::spawn(async move {
            let result = std::panic::AssertUnwindSafe(async {
                while let Some(envelope) = rx.recv().await {
                    if let Err(e) = Self::write_envelope(&pool, &envelope).await {
                        tracing::error!(
                            record_id = %envelope.record_id,
                            error = %e,
                            "Failed to write log envelope to database"
                        );
                    }
                }
            })
            .catch_unwind()
            .await;

            match result {
                Ok(()) => tracing::debug!("SqliteCollector background writer exited"),
                Err(e) => tracing::error!(panic = ?e, "SqliteCollector background writer panicked"),
            }
        });

        Self { tx }
    }

    async fn write_envelope(pool: &SqlitePool, envelope: &LogEnvelope) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO log_records (
                record_id, schema, model_name, model_version,
                sampling_rate, saved_model_tags, logged_at, record
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&envelope.record_id)
        .bind(&envelope.schema)
        .bind(&envelope.model_name)
        .bind(envelope.model_version)
        .bind(envelope.sampling_rate)
        .bind(envelope.saved_model_tags.join(","))
        .bind(envelope.logged_at)
        .bind(envelope.record.to_string())
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LogCollector for SqliteCollector {
    async fn collect(&self, envelope: LogEnvelope) -> Result<(), LogError> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| LogError::Collection("log writer channel closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{LogMetadata, ModelIdentity};
    use sqlx::Row;

    fn envelope(model: &str) -> LogEnvelope {
        let metadata = LogMetadata::for_model(ModelIdentity::new(model));
        LogEnvelope::new("test", &metadata, serde_json::json!({"model": model}))
    }

    #[tokio::test]
    async fn test_envelopes_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/request_log.db", dir.path().display());

        let collector = SqliteCollector::connect(&url, 16).await.unwrap();
        collector.collect(envelope("chat-a")).await.unwrap();
        collector.collect(envelope("chat-b")).await.unwrap();

        // Give the background writer time to drain the channel
        tokio::time::sleep(Duration::from_millis(200)).await;

        let pool = SqlitePool::connect(&url).await.unwrap();
        let row = sqlx::query("SELECT COUNT(*) AS n FROM log_records")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 2);

        let row = sqlx::query("SELECT record FROM log_records WHERE model_name = 'chat-a'")
            .fetch_one(&pool)
            .await
            .unwrap();
        let record_text: String = row.get("record");
        let record: serde_json::Value = serde_json::from_str(&record_text).unwrap();
        assert_eq!(record["model"], "chat-a");
    }
}
