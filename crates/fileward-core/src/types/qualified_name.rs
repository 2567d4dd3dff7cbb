//! Qualified names, the stable logical identifiers for file sources.
//!
//! A qualified name is a path-like string id whose levels are separated by
//! `/`. It mirrors the on-disk layout of a source without being a filesystem
//! path itself, so derived resources (thumbs) can splice a directory level
//! into their owner's id and stay addressable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::result::AppResult;

/// Separator between the levels of a qualified name.
pub const LEVEL_SEPARATOR: char = '/';

/// Stable logical identifier of a file source.
///
/// Levels are non-empty strings over `[A-Za-z0-9._~-]`, joined by
/// [`LEVEL_SEPARATOR`]. The `~` is admitted so that reserved-resource
/// directory names can appear as levels of a derived name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Create a qualified name, validating the level grammar.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(AppError::validation("Qualified name can not be empty"));
        }
        for level in value.split(LEVEL_SEPARATOR) {
            if level.is_empty() {
                return Err(AppError::validation(format!(
                    "Qualified name contains an empty level: {value:?}"
                )));
            }
            if !level.chars().all(is_level_char) {
                return Err(AppError::validation(format!(
                    "Qualified name contains illegal characters: {value:?}"
                )));
            }
        }
        Ok(Self(value))
    }

    /// Generate a fresh random qualified name (single level, 32 hex chars).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Derive a new qualified name by inserting `level` before the final
    /// level, mirroring a derived resource placed in a sibling directory
    /// of its owner.
    pub fn derived(&self, level: &str) -> AppResult<Self> {
        if level.is_empty() || !level.chars().all(is_level_char) {
            return Err(AppError::validation(format!(
                "Illegal qualified name level: {level:?}"
            )));
        }
        match self.0.rsplit_once(LEVEL_SEPARATOR) {
            Some((head, tail)) => Ok(Self(format!(
                "{head}{LEVEL_SEPARATOR}{level}{LEVEL_SEPARATOR}{tail}"
            ))),
            None => Ok(Self(format!("{level}{LEVEL_SEPARATOR}{}", self.0))),
        }
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_level_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '~')
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QualifiedName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> String {
        name.0
    }
}

impl AsRef<str> for QualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
