//! Managed file configuration.

use serde::{Deserialize, Serialize};

/// Settings applied to files under management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManageConfig {
    /// Permission mode for directories created by the manager (octal text).
    #[serde(default = "default_dir_perm")]
    pub dir_perm: String,
    /// Permission mode for files created by the manager (octal text).
    #[serde(default = "default_file_perm")]
    pub file_perm: String,
}

fn default_dir_perm() -> String {
    "0755".to_string()
}

fn default_file_perm() -> String {
    "0644".to_string()
}

impl Default for ManageConfig {
    fn default() -> Self {
        Self {
            dir_perm: default_dir_perm(),
            file_perm: default_file_perm(),
        }
    }
}
