//! The file source contract and its shared state holder.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use fileward_core::error::AppError;
use fileward_core::result::AppResult;
use fileward_core::types::QualifiedName;
use fileward_fs::{FsPath, FsPerm};

/// A logical handle on a file.
///
/// Every source is identified by a stable qualified name and backed by a
/// filesystem path, optionally with a companion info path and a public
/// URL. Once the backing file is confirmed missing the source turns
/// invalid and rejects every operation except inspection of its own
/// state.
#[async_trait]
pub trait FileSource: fmt::Debug + fmt::Display + Send + Sync {
    /// Stable logical identifier of the source.
    fn qualified_name(&self) -> &QualifiedName;

    /// The backing file path.
    fn file_path(&self) -> &FsPath;

    /// The companion info file path, if any.
    fn info_path(&self) -> Option<&FsPath>;

    /// The public URL, if the source is exposed over HTTP.
    fn url(&self) -> Option<&Url>;

    /// Whether the backing file is still assumed present.
    fn is_valid(&self) -> bool;

    /// Whether structural mutation is controlled by an external manager.
    fn is_managed(&self) -> bool {
        false
    }

    /// Whether derived thumb variants can be produced from this source.
    fn has_thumb_support(&self) -> bool {
        false
    }

    /// Whether alternate named variations can be produced from this source.
    fn has_variation_support(&self) -> bool {
        false
    }

    /// Size of the backing file in bytes.
    async fn size(&self) -> AppResult<u64>;

    /// Modification time of the backing file.
    async fn last_modified(&self) -> AppResult<DateTime<Utc>>;

    /// Relocate the backing file and apply `file_perm` to it.
    async fn move_to(
        &mut self,
        new_path: FsPath,
        file_perm: &FsPerm,
        overwrite: bool,
    ) -> AppResult<()>;

    /// Remove the backing file and info file, invalidating the source.
    async fn delete(&mut self) -> AppResult<()>;
}

/// Access point for named variations of a source.
///
/// No source variant in this layer produces variations, so the type has
/// no inhabitants; accessors returning it always fail with
/// `Unsupported`.
#[derive(Debug)]
pub enum VariationEngine {}

/// Shared state of every file source variant.
#[derive(Debug, Clone)]
pub struct SourceBase {
    qualified_name: QualifiedName,
    file_path: FsPath,
    info_path: Option<FsPath>,
    url: Option<Url>,
    valid: bool,
}

impl SourceBase {
    /// Create the state holder for a source assumed present on disk.
    pub fn new(
        qualified_name: QualifiedName,
        file_path: FsPath,
        info_path: Option<FsPath>,
    ) -> Self {
        Self {
            qualified_name,
            file_path,
            info_path,
            url: None,
            valid: true,
        }
    }

    /// Stable logical identifier of the source.
    pub fn qualified_name(&self) -> &QualifiedName {
        &self.qualified_name
    }

    /// The backing file path.
    pub fn file_path(&self) -> &FsPath {
        &self.file_path
    }

    /// The companion info file path, if any.
    pub fn info_path(&self) -> Option<&FsPath> {
        self.info_path.as_ref()
    }

    /// The public URL, if set.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Whether the backing file is still assumed present.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Set or clear the public URL.
    pub fn set_url(&mut self, url: Option<Url>) {
        self.url = url;
    }

    /// Mark the backing file as confirmed missing.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Fail with `InvalidState` unless the backing file is still assumed
    /// present.
    pub fn ensure_valid(&self) -> AppResult<()> {
        if self.valid {
            return Ok(());
        }
        Err(AppError::invalid_state(format!(
            "File source is no longer valid: {}",
            self.file_path
        )))
    }

    /// Size of the backing file in bytes.
    pub async fn size(&self) -> AppResult<u64> {
        self.ensure_valid()?;
        self.file_path.size().await
    }

    /// Modification time of the backing file.
    pub async fn last_modified(&self) -> AppResult<DateTime<Utc>> {
        self.ensure_valid()?;
        self.file_path.last_modified().await
    }

    /// Relocate the backing file, refusing to overwrite unless asked.
    ///
    /// The handle follows the file as soon as the rename lands, so a
    /// failure applying `file_perm` leaves it pointing at the new path.
    pub async fn move_to(
        &mut self,
        new_path: FsPath,
        file_perm: &FsPerm,
        overwrite: bool,
    ) -> AppResult<()> {
        self.ensure_valid()?;

        if !overwrite && new_path.exists() {
            return Err(AppError::conflict(format!(
                "Target path already exists: {new_path}"
            )));
        }

        self.file_path.rename_to(&new_path).await?;
        debug!(from = %self.file_path, to = %new_path, "Moved file source");
        self.file_path = new_path;

        self.file_path.apply_perm(file_perm).await?;
        Ok(())
    }

    /// Remove the backing file and info file, invalidating the source.
    pub async fn delete(&mut self) -> AppResult<()> {
        self.ensure_valid()?;

        self.file_path.delete().await?;
        if let Some(info_path) = &self.info_path {
            info_path.delete().await?;
        }

        debug!(path = %self.file_path, "Deleted file source");
        self.valid = false;
        Ok(())
    }
}
