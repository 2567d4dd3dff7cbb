//! Temp file configuration.

use serde::{Deserialize, Serialize};

/// Settings for session-scoped temp files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmpConfig {
    /// Directory where temp files are stored.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Hours a temp file may sit untouched before the sweeper removes it.
    #[serde(default = "default_max_idle_hours")]
    pub max_idle_hours: u64,
    /// Permission mode for the temp directory (octal text).
    #[serde(default = "default_dir_perm")]
    pub dir_perm: String,
    /// Permission mode for temp files (octal text).
    #[serde(default = "default_file_perm")]
    pub file_perm: String,
}

fn default_directory() -> String {
    "./data/temp".to_string()
}

fn default_max_idle_hours() -> u64 {
    24
}

fn default_dir_perm() -> String {
    "0700".to_string()
}

fn default_file_perm() -> String {
    "0600".to_string()
}

impl Default for TmpConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            max_idle_hours: default_max_idle_hours(),
            dir_perm: default_dir_perm(),
            file_perm: default_file_perm(),
        }
    }
}
