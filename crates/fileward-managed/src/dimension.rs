//! Image dimension value object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fileward_core::error::AppError;

/// Suffix marking a dimension whose variant is center-cropped to fill.
pub const CROP_SUFFIX: &str = "-crop";

/// A requested variant size.
///
/// Identified by its canonical encoding `"{width}x{height}"` with an
/// optional `-crop` suffix; two dimensions with the same encoding are
/// interchangeable. The encoding doubles as the directory-name seed (see
/// [`crate::naming`]) and must stay stable across versions: changing it
/// orphans every variant already cached on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageDimension {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Center-crop to fill the box exactly instead of fitting within it.
    pub crop: bool,
}

impl ImageDimension {
    /// Create a dimension.
    pub fn new(width: u32, height: u32, crop: bool) -> Self {
        Self {
            width,
            height,
            crop,
        }
    }
}

impl fmt::Display for ImageDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if self.crop {
            f.write_str(CROP_SUFFIX)?;
        }
        Ok(())
    }
}

impl FromStr for ImageDimension {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, crop) = match s.strip_suffix(CROP_SUFFIX) {
            Some(body) => (body, true),
            None => (s, false),
        };

        // u32::from_str accepts a leading +, which the encoding does not
        let parse = |part: &str| -> Option<u32> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse().ok()
        };

        body.split_once('x')
            .and_then(|(w, h)| Some(Self::new(parse(w)?, parse(h)?, crop)))
            .ok_or_else(|| AppError::invalid_dimension(format!("Invalid image dimension: {s}")))
    }
}

impl TryFrom<String> for ImageDimension {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ImageDimension> for String {
    fn from(dimension: ImageDimension) -> Self {
        dimension.to_string()
    }
}
