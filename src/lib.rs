pub mod collector;
pub mod config;
pub mod envelope;
pub mod error;
pub mod file;
pub mod logger;
pub mod metadata;
pub mod models;
pub mod sampling;
pub mod sqlite;
pub mod stream;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
