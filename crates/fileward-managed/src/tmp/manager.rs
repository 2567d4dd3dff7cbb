//! Temp file allocation and garbage collection.

use chrono::{Duration, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

use fileward_core::config::tmp::TmpConfig;
use fileward_core::error::{AppError, ErrorKind};
use fileward_core::result::AppResult;
use fileward_core::types::QualifiedName;
use fileward_fs::{FsPath, FsPerm};

use crate::tmp::source::TmpFileSource;

/// Extension of every temp file.
pub const TMP_FILE_SUFFIX: &str = ".tmp";

/// Extension appended to a temp file name for its companion info file.
pub const INFO_FILE_SUFFIX: &str = ".info";

/// Allocates temp file sources and sweeps abandoned ones.
///
/// Sources bound to a session survive their drop; the idle sweep is what
/// eventually collects them once nothing touches their files anymore.
#[derive(Debug, Clone)]
pub struct TmpFileManager {
    directory: FsPath,
    dir_perm: FsPerm,
    file_perm: FsPerm,
    max_idle: Duration,
}

impl TmpFileManager {
    /// Create a manager from configuration.
    pub fn new(config: &TmpConfig) -> AppResult<Self> {
        Ok(Self {
            directory: FsPath::new(&config.directory),
            dir_perm: config.dir_perm.parse()?,
            file_perm: config.file_perm.parse()?,
            max_idle: Duration::hours(config.max_idle_hours as i64),
        })
    }

    /// The directory temp files are allocated in.
    pub fn directory(&self) -> &FsPath {
        &self.directory
    }

    /// Materialize the temp directory.
    pub async fn ensure_dir(&self) -> AppResult<()> {
        self.directory.mkdirs(&self.dir_perm).await
    }

    /// Allocate a fresh temp file source.
    ///
    /// The file (and info file when requested) is created empty with the
    /// configured permissions. An unbound source deletes its files again
    /// when dropped.
    pub async fn create_source(
        &self,
        session_id: Option<String>,
        with_info: bool,
    ) -> AppResult<TmpFileSource> {
        let qualified_name = QualifiedName::generate();
        let file_path = self
            .directory
            .join(format!("{qualified_name}{TMP_FILE_SUFFIX}"));
        file_path
            .mkdirs_and_create_file(&self.dir_perm, &self.file_perm)
            .await?;

        let info_path = if with_info {
            let info_path = self
                .directory
                .join(format!("{qualified_name}{TMP_FILE_SUFFIX}{INFO_FILE_SUFFIX}"));
            info_path
                .mkdirs_and_create_file(&self.dir_perm, &self.file_perm)
                .await?;
            Some(info_path)
        } else {
            None
        };

        debug!(
            path = %file_path,
            session = session_id.as_deref().unwrap_or("-"),
            "Allocated tmp file"
        );
        Ok(TmpFileSource::new(
            qualified_name,
            file_path,
            info_path,
            session_id,
        ))
    }

    /// Remove temp files untouched for longer than the configured maximum
    /// idle time.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        self.sweep(self.max_idle).await
    }

    /// Remove temp files untouched for longer than `max_idle`.
    ///
    /// This is the collection side of the touch protocol: deserializing a
    /// source refreshes its mtime and keeps it out of the sweep. Returns
    /// the number of files removed; per-entry failures are logged and
    /// skipped so one bad entry does not stall the rest.
    pub async fn sweep(&self, max_idle: Duration) -> AppResult<u64> {
        let cutoff = Utc::now() - max_idle;
        let mut removed = 0u64;

        if !self.directory.exists() {
            return Ok(0);
        }

        let mut entries = fs::read_dir(self.directory.as_path()).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read tmp directory: {}", self.directory),
                e,
            )
        })?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if chrono::DateTime::<Utc>::from(modified) >= cutoff {
                continue;
            }

            let path = entry.path();
            if let Err(e) = fs::remove_file(&path).await {
                warn!("Failed to remove stale tmp file {:?}: {}", path, e);
            } else {
                removed += 1;
            }
        }

        info!(directory = %self.directory, removed, "Swept tmp directory");
        Ok(removed)
    }
}
