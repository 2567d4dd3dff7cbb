//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod logging;
pub mod manage;
pub mod tmp;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::manage::ManageConfig;
use self::tmp::TmpConfig;

use crate::error::AppError;

/// Root configuration for the managed-file layer.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay). Every
/// section falls back to its defaults, so an empty configuration is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilewardConfig {
    /// Managed file settings.
    #[serde(default)]
    pub manage: ManageConfig,
    /// Temp file settings.
    #[serde(default)]
    pub tmp: TmpConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FilewardConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `FILEWARD_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FILEWARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
