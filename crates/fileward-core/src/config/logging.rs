//! Logging configuration and tracing bootstrap.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt};

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format: "json" or "pretty".
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

/// Initialize tracing/logging.
///
/// `RUST_LOG` takes precedence over the configured level. Safe to call
/// more than once; later calls keep the first subscriber.
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            let _ = fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .try_init();
        }
        _ => {
            let _ = fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .try_init();
        }
    }
}
