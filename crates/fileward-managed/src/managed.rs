//! Managed file sources.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use fileward_core::config::manage::ManageConfig;
use fileward_core::error::AppError;
use fileward_core::result::AppResult;
use fileward_core::types::QualifiedName;
use fileward_fs::{FsPath, FsPerm};
use fileward_img::mime::{is_supported_image_mime, resolve_mime_type};

use crate::source::{FileSource, SourceBase};
use crate::thumb::ThumbEngine;

/// A file whose lifecycle belongs to an external owning subsystem.
///
/// Structural mutation through the source always fails while the instance
/// exists; relocation and removal go through the owning manager, which
/// calls [`invalidate`](Self::invalidate) once it removed the file
/// itself. The permission bits are applied when the thumb engine
/// materializes variant files next to the owner.
#[derive(Debug, Clone)]
pub struct ManagedFileSource {
    base: SourceBase,
    file_manager_name: String,
    dir_perm: FsPerm,
    file_perm: FsPerm,
    persistent: bool,
}

impl ManagedFileSource {
    /// Place a file under management.
    pub fn new(
        file_path: FsPath,
        file_manager_name: impl Into<String>,
        qualified_name: QualifiedName,
        dir_perm: FsPerm,
        file_perm: FsPerm,
    ) -> Self {
        Self {
            base: SourceBase::new(qualified_name, file_path, None),
            file_manager_name: file_manager_name.into(),
            dir_perm,
            file_perm,
            persistent: false,
        }
    }

    /// Place a file under management with permission bits from
    /// configuration.
    pub fn with_config(
        file_path: FsPath,
        file_manager_name: impl Into<String>,
        qualified_name: QualifiedName,
        config: &ManageConfig,
    ) -> AppResult<Self> {
        Ok(Self::new(
            file_path,
            file_manager_name,
            qualified_name,
            config.dir_perm.parse()?,
            config.file_perm.parse()?,
        ))
    }

    /// Name of the owning manager.
    pub fn file_manager_name(&self) -> &str {
        &self.file_manager_name
    }

    /// Permission mode for directories the thumb engine creates.
    pub fn dir_perm(&self) -> &FsPerm {
        &self.dir_perm
    }

    /// Permission mode for files the thumb engine creates.
    pub fn file_perm(&self) -> &FsPerm {
        &self.file_perm
    }

    /// Whether the owning manager has persisted this source.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Record whether the owning manager has persisted this source.
    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Expose the source under a public URL.
    pub fn set_url(&mut self, url: Option<Url>) {
        self.base.set_url(url);
    }

    /// Mark the backing file as confirmed missing.
    ///
    /// Called by the owning manager after it removed the file itself.
    pub fn invalidate(&mut self) {
        self.base.invalidate();
    }

    pub(crate) fn base(&self) -> &SourceBase {
        &self.base
    }

    /// The thumb engine bound to this source.
    ///
    /// Fails with `InvalidState` when the source is no longer valid, and
    /// with `Unsupported` when the file is not a supported image; query
    /// [`FileSource::has_thumb_support`] first.
    pub fn thumb_engine(&self) -> AppResult<ThumbEngine<'_>> {
        self.base.ensure_valid()?;

        let mime_type = resolve_mime_type(self.base.file_path())
            .filter(|m| is_supported_image_mime(m))
            .ok_or_else(|| {
                AppError::unsupported(format!(
                    "Thumb support not available for file: {}",
                    self.base.file_path()
                ))
            })?;

        Ok(ThumbEngine::new(self, mime_type))
    }
}

#[async_trait]
impl FileSource for ManagedFileSource {
    fn qualified_name(&self) -> &QualifiedName {
        self.base.qualified_name()
    }

    fn file_path(&self) -> &FsPath {
        self.base.file_path()
    }

    fn info_path(&self) -> Option<&FsPath> {
        self.base.info_path()
    }

    fn url(&self) -> Option<&Url> {
        self.base.url()
    }

    fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    fn is_managed(&self) -> bool {
        true
    }

    fn has_thumb_support(&self) -> bool {
        resolve_mime_type(self.base.file_path()).is_some_and(is_supported_image_mime)
    }

    async fn size(&self) -> AppResult<u64> {
        self.base.size().await
    }

    async fn last_modified(&self) -> AppResult<DateTime<Utc>> {
        self.base.last_modified().await
    }

    async fn move_to(
        &mut self,
        _new_path: FsPath,
        _file_perm: &FsPerm,
        _overwrite: bool,
    ) -> AppResult<()> {
        self.base.ensure_valid()?;

        Err(AppError::management_constraint(format!(
            "File is managed by {} and can not be relocated: {}",
            self.file_manager_name,
            self.base.file_path()
        )))
    }

    async fn delete(&mut self) -> AppResult<()> {
        self.base.ensure_valid()?;

        Err(AppError::management_constraint(format!(
            "File is managed by {} and can not be deleted: {}",
            self.file_manager_name,
            self.base.file_path()
        )))
    }
}

impl fmt::Display for ManagedFileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (managed by {})",
            self.base.file_path(),
            self.file_manager_name
        )
    }
}
