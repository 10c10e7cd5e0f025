use thiserror::Error;

/// Errors surfaced by the logging subsystem.
///
/// A dropped parent logger is deliberately not represented here: stream
/// messages arriving after the owning logging scope ended are skipped
/// silently rather than reported as failures.
#[derive(Debug, Error)]
pub enum LogError {
    /// The schema hook could not build an envelope for this exchange
    #[error("Envelope construction failed: {0}")]
    EnvelopeConstruction(String),
    /// The collector sink rejected or could not persist the envelope
    #[error("Collection failed: {0}")]
    Collection(String),
    /// Invalid logging configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        Self::EnvelopeConstruction(format!("JSON error: {}", err))
    }
}

impl From<sqlx::Error> for LogError {
    fn from(err: sqlx::Error) -> Self {
        Self::Collection(format!("database error: {}", err))
    }
}
