//! Materialized thumb variant sources.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use fileward_core::error::AppError;
use fileward_core::result::AppResult;
use fileward_core::types::QualifiedName;
use fileward_fs::{FsPath, FsPerm};

use crate::dimension::ImageDimension;
use crate::source::{FileSource, SourceBase};

/// One materialized variant of a managed image file.
///
/// Bound to exactly one owner and one dimension; its path is always
/// `<owner-parent>/<dimension-dir>/<owner-name>`. Variants are under the
/// same management constraint as their owner and disappear through
/// [`ThumbEngine::clear`](crate::thumb::ThumbEngine::clear), never
/// through the source itself.
#[derive(Debug, Clone)]
pub struct ThumbFileSource {
    base: SourceBase,
    dimension: ImageDimension,
    mime_type: String,
    file_manager_name: String,
}

impl ThumbFileSource {
    pub(crate) fn new(
        qualified_name: QualifiedName,
        file_path: FsPath,
        dimension: ImageDimension,
        mime_type: impl Into<String>,
        file_manager_name: impl Into<String>,
    ) -> Self {
        Self {
            base: SourceBase::new(qualified_name, file_path, None),
            dimension,
            mime_type: mime_type.into(),
            file_manager_name: file_manager_name.into(),
        }
    }

    pub(crate) fn set_url(&mut self, url: Option<Url>) {
        self.base.set_url(url);
    }

    /// The dimension this variant was materialized for.
    pub fn dimension(&self) -> ImageDimension {
        self.dimension
    }

    /// The MIME type shared with the owner.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

#[async_trait]
impl FileSource for ThumbFileSource {
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

impl fmt::Display for ThumbFileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (managed by {})",
            self.base.file_path(),
            self.file_manager_name
        )
    }
}
