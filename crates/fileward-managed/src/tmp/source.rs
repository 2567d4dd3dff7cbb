//! Temp file sources.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use fileward_core::error::AppError;
use fileward_core::result::AppResult;
use fileward_core::types::QualifiedName;
use fileward_fs::{FsPath, FsPerm};

use crate::source::{FileSource, SourceBase, VariationEngine};
use crate::thumb::ThumbEngine;

/// Serialized form of a [`TmpFileSource`].
#[derive(Debug, Serialize, Deserialize)]
struct PersistedTmpFile {
    qualified_name: QualifiedName,
    file_path: FsPath,
    info_path: Option<FsPath>,
    url: Option<Url>,
    session_id: Option<String>,
}

/// An ephemeral file, optionally bound to a session.
///
/// A source never bound to a session deletes its files when dropped while
/// still valid; a session-bound source is left on disk for the
/// session-end cleanup and the idle sweep. Deliberately not `Clone`: each
/// live instance exclusively owns its path.
#[derive(Debug)]
pub struct TmpFileSource {
    base: SourceBase,
    session_id: Option<String>,
}

impl TmpFileSource {
    pub(crate) fn new(
        qualified_name: QualifiedName,
        file_path: FsPath,
        info_path: Option<FsPath>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            base: SourceBase::new(qualified_name, file_path, info_path),
            session_id,
        }
    }

    /// The owning session, if the source has been bound to one.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Bind this source to a session, disarming self-deletion on drop.
    pub fn bind_to_session(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    /// Expose the source under a public URL.
    pub fn set_url(&mut self, url: Option<Url>) {
        self.base.set_url(url);
    }

    /// The thumb engine is never available on a tmp file.
    pub fn thumb_engine(&self) -> AppResult<ThumbEngine<'_>> {
        Err(AppError::unsupported(format!(
            "Thumb support not available for tmp file: {}",
            self.base.file_path()
        )))
    }

    /// The variation engine is never available on a tmp file.
    pub fn variation_engine(&self) -> AppResult<VariationEngine> {
        Err(AppError::unsupported(format!(
            "Variation support not available for tmp file: {}",
            self.base.file_path()
        )))
    }

    /// Encode the source state for cross-request persistence.
    pub fn serialize(&self) -> AppResult<String> {
        let persisted = PersistedTmpFile {
            qualified_name: self.base.qualified_name().clone(),
            file_path: self.base.file_path().clone(),
            info_path: self.base.info_path().cloned(),
            url: self.base.url().cloned(),
            session_id: self.session_id.clone(),
        };
        Ok(serde_json::to_string(&persisted)?)
    }

    /// Decode a source persisted with [`serialize`](Self::serialize).
    ///
    /// Fails with `Deserialization` on mis-shaped input. A decoded source
    /// whose file is gone comes back with `valid == false` and nothing
    /// else happens; otherwise file and info file are touched so an
    /// external idle sweep sees them as still in use.
    pub fn deserialize(serialized: &str) -> AppResult<TmpFileSource> {
        let persisted: PersistedTmpFile = serde_json::from_str(serialized)
            .map_err(|_| AppError::deserialization("Malformed tmp file state"))?;
        if persisted.file_path.as_path().as_os_str().is_empty() {
            return Err(AppError::deserialization("Malformed tmp file state"));
        }

        let mut base = SourceBase::new(
            persisted.qualified_name,
            persisted.file_path,
            persisted.info_path,
        );
        base.set_url(persisted.url);

        let mut source = TmpFileSource {
            base,
            session_id: persisted.session_id,
        };

        if !source.base.file_path().exists() {
            source.base.invalidate();
            return Ok(source);
        }

        source.base.file_path().touch()?;
        if let Some(info_path) = source.base.info_path() {
            info_path.touch()?;
        }

        Ok(source)
    }
}

#[async_trait]
impl FileSource for TmpFileSource {
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

    async fn size(&self) -> AppResult<u64> {
        self.base.size().await
    }

    async fn last_modified(&self) -> AppResult<DateTime<Utc>> {
        self.base.last_modified().await
    }

    async fn move_to(
        &mut self,
        new_path: FsPath,
        file_perm: &FsPerm,
        overwrite: bool,
    ) -> AppResult<()> {
        self.base.move_to(new_path, file_perm, overwrite).await
    }

    async fn delete(&mut self) -> AppResult<()> {
        self.base.delete().await
    }
}

impl fmt::Display for TmpFileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp file {}", self.base.file_path())
    }
}

impl Drop for TmpFileSource {
    fn drop(&mut self) {
        if self.session_id.is_some() || !self.base.is_valid() {
            return;
        }

        let mut paths = vec![self.base.file_path().clone()];
        if let Some(info_path) = self.base.info_path() {
            paths.push(info_path.clone());
        }

        for path in paths {
            if let Err(e) = std::fs::remove_file(path.as_path()) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path, error = %e, "Failed to remove tmp file on drop");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use fileward_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_deserialize_rejects_malformed_input() {
        for bad in [
            "",
            "not json",
            "{}",
            r#"{"qualified_name": "a", "file_path": 42}"#,
            r#"{"qualified_name": "a", "file_path": "", "info_path": null, "url": null, "session_id": null}"#,
        ] {
            let err = TmpFileSource::deserialize(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Deserialization, "accepted {bad:?}");
        }
    }

    #[test]
    fn test_thumb_and_variation_engines_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = FsPath::from(dir.path()).join("upload.tmp");
        path.touch().unwrap();

        let source = TmpFileSource::new(QualifiedName::generate(), path, None, None);
        assert!(!source.has_thumb_support());
        assert!(!source.has_variation_support());

        let err = source.thumb_engine().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert!(err.message.contains("Thumb support not available for tmp file"));

        let err = source.variation_engine().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert!(err.message.contains("Variation support not available for tmp file"));
    }
}
