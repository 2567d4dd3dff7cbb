//! Validated octal permission modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fileward_core::error::AppError;
use fileward_core::result::AppResult;

/// A filesystem permission mode, kept in its octal text form.
///
/// Validated on construction: one to four octal digits (e.g. `"0755"`,
/// `"640"`). The numeric mode is precomputed so applying it is infallible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FsPerm {
    text: String,
    mode: u32,
}

impl FsPerm {
    /// Parse an octal permission string.
    pub fn new(text: impl Into<String>) -> AppResult<Self> {
        let text = text.into();
        let octal =
            (1..=4).contains(&text.len()) && text.bytes().all(|b| (b'0'..=b'7').contains(&b));
        if !octal {
            return Err(AppError::validation(format!(
                "Invalid permission mode: {text}"
            )));
        }

        let mode = u32::from_str_radix(&text, 8).unwrap_or_default();
        Ok(Self { text, mode })
    }

    /// The numeric mode, e.g. `0o755`.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// The original octal text, e.g. `"0755"`.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for FsPerm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for FsPerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for FsPerm {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FsPerm> for String {
    fn from(perm: FsPerm) -> Self {
        perm.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_modes() {
        assert_eq!(FsPerm::new("0755").unwrap().mode(), 0o755);
        assert_eq!(FsPerm::new("644").unwrap().mode(), 0o644);
        assert_eq!(FsPerm::new("0").unwrap().mode(), 0);
        assert_eq!(FsPerm::new("0700").unwrap().as_str(), "0700");
    }

    #[test]
    fn test_invalid_modes_rejected() {
        for bad in ["", "abc", "0999", "07555", "+7", "0o755"] {
            assert!(FsPerm::new(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let perm = FsPerm::new("0640").unwrap();
        let json = serde_json::to_string(&perm).unwrap();
        assert_eq!(json, "\"0640\"");

        let back: FsPerm = serde_json::from_str(&json).unwrap();
        assert_eq!(back, perm);
        assert_eq!(back.mode(), 0o640);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<FsPerm>("\"rwxr-xr-x\"").is_err());
    }
}
