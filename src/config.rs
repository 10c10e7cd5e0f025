use serde::{Deserialize, Serialize};

/// Sampling configuration bound to a `RequestLogger` instance.
///
/// Immutable once a logger is constructed from it; the same value is
/// stamped into the metadata of every record that logger emits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Probability in [0, 1] that a given exchange is logged
    pub sampling_rate: f64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { sampling_rate: 0.0 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Tags identifying the serving variant (e.g. "serve", "gpu"),
    /// stamped into every record's metadata in configured order
    #[serde(default)]
    pub saved_model_tags: Vec<String>,
    #[serde(default)]
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorConfig {
    /// Which sink receives envelopes: "memory", "tracing", "sqlite" or "file"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// SQLite database URL (sqlite backend)
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Directory receiving rolling JSONL files (file backend)
    #[serde(default = "default_log_directory")]
    pub log_directory: String,
    /// Channel capacity of the background writer (sqlite backend)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_backend() -> String {
    "tracing".to_string()
}

fn default_database_url() -> String {
    "sqlite://./data/request_log.db".to_string()
}

fn default_log_directory() -> String {
    "./data/request_log".to_string()
}

fn default_buffer_size() -> usize {
    10_000
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_url: default_database_url(),
            log_directory: default_log_directory(),
            buffer_size: default_buffer_size(),
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::with_name("request_log"))
        .add_source(config::Environment::with_prefix("LLM_REQUEST_LOG").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    let rate = cfg.logging.sampling_rate;
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        anyhow::bail!("sampling_rate must be in [0, 1], got {}", rate);
    }

    for tag in &cfg.saved_model_tags {
        if tag.is_empty() {
            anyhow::bail!("saved_model_tags entries cannot be empty");
        }
    }

    match cfg.collector.backend.as_str() {
        "memory" | "tracing" => {}
        "sqlite" => {
            if cfg.collector.database_url.is_empty() {
                anyhow::bail!("sqlite collector requires a database_url");
            }
        }
        "file" => {
            if cfg.collector.log_directory.is_empty() {
                anyhow::bail!("file collector requires a log_directory");
            }
        }
        other => anyhow::bail!("Invalid collector backend: {}", other),
    }

    if cfg.collector.buffer_size == 0 {
        anyhow::bail!("collector buffer_size must be greater than zero");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            logging: LoggingConfig { sampling_rate: 0.1 },
            saved_model_tags: vec!["serve".to_string()],
            collector: CollectorConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_sampling_rate_bounds() {
        let mut cfg = base_config();
        cfg.logging.sampling_rate = 1.5;
        assert!(validate_config(&cfg).is_err());

        cfg.logging.sampling_rate = -0.1;
        assert!(validate_config(&cfg).is_err());

        cfg.logging.sampling_rate = f64::NAN;
        assert!(validate_config(&cfg).is_err());

        cfg.logging.sampling_rate = 1.0;
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut cfg = base_config();
        cfg.collector.backend = "kafka".to_string();
        let err = validate_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Invalid collector backend"));
    }

    #[test]
    fn test_empty_tag_rejected() {
        let mut cfg = base_config();
        cfg.saved_model_tags.push(String::new());
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let mut cfg = base_config();
        cfg.collector.buffer_size = 0;
        assert!(validate_config(&cfg).is_err());
    }
}
