//! Owned filesystem paths with the operations the managed layer needs.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use filetime::FileTime;
use globset::Glob;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use fileward_core::error::{AppError, ErrorKind};
use fileward_core::result::AppResult;

use crate::perm::FsPerm;

/// An owned filesystem path.
///
/// Wraps [`PathBuf`] and adds the create/inspect/glob operations used by
/// file sources. Inspection methods and [`touch`](Self::touch) are
/// synchronous; everything else that mutates the filesystem or reads
/// directory contents is async.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FsPath(PathBuf);

impl FsPath {
    /// Create a path from anything convertible into a [`PathBuf`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Borrow the underlying path.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }

    /// The parent directory, or `None` for a root or single-segment path.
    pub fn parent(&self) -> Option<FsPath> {
        self.0
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(FsPath::from)
    }

    /// The final path component as a string, if there is one.
    pub fn name(&self) -> Option<String> {
        self.0.file_name().map(|n| n.to_string_lossy().into_owned())
    }

    /// Append a component to this path.
    pub fn join(&self, component: impl AsRef<Path>) -> FsPath {
        Self(self.0.join(component))
    }

    /// Whether the path exists on disk.
    pub fn exists(&self) -> bool {
        self.0.exists()
    }

    /// Whether the path exists and is a directory.
    pub fn is_dir(&self) -> bool {
        self.0.is_dir()
    }

    /// Whether the path exists and is a regular file.
    pub fn is_file(&self) -> bool {
        self.0.is_file()
    }

    /// Update access and modification times to now, creating an empty
    /// file first if the path does not exist.
    pub fn touch(&self) -> AppResult<()> {
        if !self.0.exists() {
            std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .open(&self.0)
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to create file: {self}"),
                        e,
                    )
                })?;
        }

        let now = FileTime::now();
        filetime::set_file_times(&self.0, now, now).map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to touch file: {self}"), e)
        })
    }

    /// Create this directory and any missing ancestors, applying `perm`
    /// to each directory created.
    ///
    /// Directories that already exist are left untouched, including their
    /// permissions. A concurrent creator winning the race is not an error.
    pub async fn mkdirs(&self, perm: &FsPerm) -> AppResult<()> {
        let mut missing = Vec::new();
        let mut current = self.0.clone();
        loop {
            if current.as_os_str().is_empty() || current.exists() {
                break;
            }
            missing.push(current.clone());
            match current.parent() {
                Some(p) => current = p.to_path_buf(),
                None => break,
            }
        }

        if missing.is_empty() {
            return Ok(());
        }

        for dir in missing.iter().rev() {
            match fs::create_dir(dir).await {
                Ok(()) => FsPath::from(dir.as_path()).apply_perm(perm).await?,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to create directory: {}", dir.display()),
                        e,
                    ));
                }
            }
        }

        debug!(path = %self, "Created directory chain");
        Ok(())
    }

    /// Create an empty file at this path, creating missing parent
    /// directories with `dir_perm` and applying `file_perm` to the file.
    ///
    /// An already existing file is left in place.
    pub async fn mkdirs_and_create_file(
        &self,
        dir_perm: &FsPerm,
        file_perm: &FsPerm,
    ) -> AppResult<()> {
        if let Some(parent) = self.parent() {
            parent.mkdirs(dir_perm).await?;
        }

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.0)
            .await
        {
            Ok(_) => self.apply_perm(file_perm).await,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create file: {self}"),
                e,
            )),
        }
    }

    /// List entries below this directory matching a glob pattern.
    ///
    /// The pattern is split on `/` and each segment is matched against one
    /// directory level; intermediate segments only descend into
    /// directories. A missing directory anywhere along the way yields an
    /// empty result. Matches are returned sorted.
    pub async fn children(&self, pattern: &str) -> AppResult<Vec<FsPath>> {
        if pattern.is_empty() {
            return Err(AppError::validation("Empty glob pattern"));
        }

        let mut matchers = Vec::new();
        for segment in pattern.split('/') {
            let glob = Glob::new(segment).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Validation,
                    format!("Invalid glob pattern: {segment}"),
                    e,
                )
            })?;
            matchers.push(glob.compile_matcher());
        }

        let mut frontier = vec![self.0.clone()];
        for (depth, matcher) in matchers.iter().enumerate() {
            let last = depth + 1 == matchers.len();
            let mut next = Vec::new();

            for dir in &frontier {
                let mut entries = match fs::read_dir(dir).await {
                    Ok(rd) => rd,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(e) => {
                        return Err(AppError::with_source(
                            ErrorKind::Storage,
                            format!("Failed to list directory: {}", dir.display()),
                            e,
                        ));
                    }
                };

                while let Some(entry) = entries.next_entry().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
                })? {
                    let name = entry.file_name();
                    let Some(name) = name.to_str() else {
                        continue;
                    };
                    if !matcher.is_match(name) {
                        continue;
                    }
                    let path = entry.path();
                    if !last && !path.is_dir() {
                        continue;
                    }
                    next.push(path);
                }
            }

            frontier = next;
            if frontier.is_empty() {
                break;
            }
        }

        let mut found: Vec<FsPath> = frontier.into_iter().map(FsPath::from).collect();
        found.sort();
        Ok(found)
    }

    /// Remove the file at this path. A missing file is not an error.
    pub async fn delete(&self) -> AppResult<()> {
        match fs::remove_file(&self.0).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file: {self}"),
                e,
            )),
        }
    }

    /// Rename the file at this path to `target`.
    pub async fn rename_to(&self, target: &FsPath) -> AppResult<()> {
        fs::rename(&self.0, &target.0).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to rename {self} -> {target}"),
                e,
            )
        })
    }

    /// Size of the file in bytes.
    pub async fn size(&self) -> AppResult<u64> {
        Ok(self.metadata().await?.len())
    }

    /// Modification time of the file.
    pub async fn last_modified(&self) -> AppResult<DateTime<Utc>> {
        let modified = self.metadata().await?.modified().map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to read mtime: {self}"), e)
        })?;
        Ok(DateTime::<Utc>::from(modified))
    }

    /// Apply a permission mode to this path. No-op on non-Unix platforms.
    pub async fn apply_perm(&self, perm: &FsPerm) -> AppResult<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(perm.mode());
            fs::set_permissions(&self.0, permissions).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to set permissions on {self}"),
                    e,
                )
            })?;
        }
        #[cfg(not(unix))]
        let _ = perm;
        Ok(())
    }

    async fn metadata(&self) -> AppResult<std::fs::Metadata> {
        fs::metadata(&self.0).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::storage(format!("Path not found: {self}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to get metadata: {self}"),
                    e,
                )
            }
        })
    }
}

impl From<PathBuf> for FsPath {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for FsPath {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl AsRef<Path> for FsPath {
    fn as_ref(&self) -> &Path {
        self.0.as_path()
    }
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Escape a literal file name for use as one segment of a
/// [`FsPath::children`] pattern.
pub fn escape_glob(segment: &str) -> String {
    globset::escape(segment)
}
