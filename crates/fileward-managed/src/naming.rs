//! Reserved directory-name grammar for derived-resource directories.
//!
//! Variant directories live next to the file they derive from and are
//! named `~res-<seed>~`, e.g. `~res-100x100-crop~`. The grammar is a
//! stable on-disk contract: consumers scanning a managed file's sibling
//! directories recognize this shape to keep engine-owned cache
//! directories apart from user content, and previously cached variants
//! stay discoverable across versions.

use fileward_core::error::AppError;
use fileward_core::result::AppResult;

use crate::dimension::ImageDimension;

/// Prefix of every reserved resource directory name.
pub const RES_DIR_PREFIX: &str = "~res-";

/// Final character of every reserved resource directory name.
pub const RES_DIR_SUFFIX: char = '~';

/// Glob matching every reserved resource directory name.
pub const RES_DIR_GLOB: &str = "~res-*";

fn is_seed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Encode a seed into a reserved resource directory name.
///
/// Fails with `InvalidDimension` when the seed is empty or contains
/// characters outside the reserved-name grammar.
pub fn res_dir_name(seed: &str) -> AppResult<String> {
    if seed.is_empty() || !seed.chars().all(is_seed_char) {
        return Err(AppError::invalid_dimension(format!(
            "Seed can not be encoded into a resource directory name: {seed}"
        )));
    }
    Ok(format!("{RES_DIR_PREFIX}{seed}{RES_DIR_SUFFIX}"))
}

/// Check whether a directory name belongs to the reserved namespace.
pub fn is_res_dir_name(name: &str) -> bool {
    parse_res_name(name).is_some()
}

/// Decode the seed out of a reserved resource directory name.
///
/// Returns `None` when the name does not follow the grammar.
pub fn parse_res_name(name: &str) -> Option<&str> {
    let seed = name
        .strip_prefix(RES_DIR_PREFIX)?
        .strip_suffix(RES_DIR_SUFFIX)?;
    if seed.is_empty() || !seed.chars().all(is_seed_char) {
        return None;
    }
    Some(seed)
}

/// Encode a dimension into its variant directory name.
pub fn dimension_dir_name(dimension: ImageDimension) -> AppResult<String> {
    res_dir_name(&dimension.to_string())
}

/// Decode a directory name back into a dimension.
///
/// Returns `None` for names outside the reserved grammar and for reserved
/// names whose seed is not a dimension encoding.
pub fn parse_dimension_dir_name(name: &str) -> Option<ImageDimension> {
    parse_res_name(name)?.parse().ok()
}
