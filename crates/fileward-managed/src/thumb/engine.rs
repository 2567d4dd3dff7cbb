//! Lazy creation and discovery of dimension variants.

use std::collections::HashMap;

use tracing::debug;
use url::Url;

use fileward_core::error::AppError;
use fileward_core::result::AppResult;
use fileward_fs::{FsPath, escape_glob};
use fileward_img::{ImageCodec, ImageResource};

use crate::dimension::ImageDimension;
use crate::managed::ManagedFileSource;
use crate::naming::{RES_DIR_GLOB, dimension_dir_name, parse_dimension_dir_name};

use super::gate::CREATE_GATE;
use super::source::ThumbFileSource;

/// Derives and caches resized variants of one managed image file.
///
/// Stateless beyond construction: every call re-derives its answer from
/// the filesystem, so concurrent requests and external cleanups are
/// always observed. Variants live at
/// `<owner-parent>/<dimension-dir>/<owner-name>` and share the owner's
/// format.
#[derive(Debug)]
pub struct ThumbEngine<'a> {
    owner: &'a ManagedFileSource,
    mime_type: &'static str,
}

impl<'a> ThumbEngine<'a> {
    pub(crate) fn new(owner: &'a ManagedFileSource, mime_type: &'static str) -> Self {
        Self { owner, mime_type }
    }

    /// The MIME type shared by the owner and every variant.
    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    /// Look up an existing variant without creating it.
    ///
    /// Mirrors the owner's public URL into a sibling variant URL when the
    /// owner exposes one.
    pub fn get_by_dimension(
        &self,
        dimension: ImageDimension,
    ) -> AppResult<Option<ThumbFileSource>> {
        let file_path = self.thumb_path(dimension)?;
        if !file_path.exists() {
            return Ok(None);
        }
        Ok(Some(self.make_source(file_path, dimension)?))
    }

    /// Materialize a variant, writing `resource` through the owner-format
    /// codec.
    ///
    /// The directory chain is created with the owner's permission bits;
    /// a partially existing chain is fine. The write is unconditional, so
    /// re-creating a dimension replaces the cached file. Creation is
    /// serialized per `(owner path, dimension)` through a process-wide
    /// single-flight gate, which turns concurrent creates into a
    /// last-writer-wins sequence instead of interleaved writes.
    pub async fn create(
        &self,
        resource: &ImageResource,
        dimension: ImageDimension,
    ) -> AppResult<ThumbFileSource> {
        let file_path = self.thumb_path(dimension)?;
        let key = format!("{}|{}", self.owner_path(), dimension);

        CREATE_GATE
            .run(&key, async {
                file_path
                    .mkdirs_and_create_file(self.owner.dir_perm(), self.owner.file_perm())
                    .await?;
                ImageCodec::for_path(file_path.clone())?.save(resource).await?;
                debug!(
                    owner = %self.owner_path(),
                    dimension = %dimension,
                    path = %file_path,
                    "Created thumb variant"
                );
                Ok::<_, AppError>(())
            })
            .await?;

        self.make_source(file_path, dimension)
    }

    /// Dimensions that have a reserved directory next to the owner,
    /// whether or not this owner has a variant in them. Reserved names
    /// that do not decode to a dimension are skipped.
    pub async fn possible_dimensions(&self) -> AppResult<Vec<ImageDimension>> {
        let mut dimensions = Vec::new();
        for dir in self.owner_parent()?.children(RES_DIR_GLOB).await? {
            if !dir.is_dir() {
                continue;
            }
            let Some(name) = dir.name() else {
                continue;
            };
            if let Some(dimension) = parse_dimension_dir_name(&name) {
                dimensions.push(dimension);
            }
        }
        Ok(dimensions)
    }

    /// Dimensions actually materialized for this owner.
    pub async fn used_dimensions(&self) -> AppResult<Vec<ImageDimension>> {
        let mut dimensions = Vec::new();
        for path in self.find_thumb_paths().await? {
            let Some(dir_name) = path.parent().and_then(|p| p.name()) else {
                continue;
            };
            if let Some(dimension) = parse_dimension_dir_name(&dir_name) {
                dimensions.push(dimension);
            }
        }
        Ok(dimensions)
    }

    /// Delete every materialized variant of this owner. The dimension
    /// directories themselves are left in place, possibly empty.
    pub async fn clear(&self) -> AppResult<()> {
        let paths = self.find_thumb_paths().await?;
        let count = paths.len();
        for path in &paths {
            path.delete().await?;
        }

        debug!(owner = %self.owner_path(), count, "Cleared thumb variants");
        Ok(())
    }

    /// Every materialized variant of this owner, keyed by the canonical
    /// dimension encoding.
    pub async fn all(&self) -> AppResult<HashMap<String, ThumbFileSource>> {
        let mut sources = HashMap::new();
        for path in self.find_thumb_paths().await? {
            let Some(dir_name) = path.parent().and_then(|p| p.name()) else {
                continue;
            };
            let Some(dimension) = parse_dimension_dir_name(&dir_name) else {
                continue;
            };
            sources.insert(dimension.to_string(), self.make_source(path, dimension)?);
        }
        Ok(sources)
    }

    fn owner_path(&self) -> &FsPath {
        self.owner.base().file_path()
    }

    fn owner_parent(&self) -> AppResult<FsPath> {
        self.owner_path().parent().ok_or_else(|| {
            AppError::validation(format!(
                "File source path has no parent directory: {}",
                self.owner_path()
            ))
        })
    }

    fn owner_name(&self) -> AppResult<String> {
        self.owner_path().name().ok_or_else(|| {
            AppError::validation(format!(
                "File source path has no file name: {}",
                self.owner_path()
            ))
        })
    }

    fn thumb_path(&self, dimension: ImageDimension) -> AppResult<FsPath> {
        let dir_name = dimension_dir_name(dimension)?;
        Ok(self.owner_parent()?.join(dir_name).join(self.owner_name()?))
    }

    /// All variant files of this owner across every reserved directory.
    async fn find_thumb_paths(&self) -> AppResult<Vec<FsPath>> {
        let pattern = format!("{RES_DIR_GLOB}/{}", escape_glob(&self.owner_name()?));
        let paths = self.owner_parent()?.children(&pattern).await?;
        Ok(paths.into_iter().filter(|p| p.is_file()).collect())
    }

    fn make_source(
        &self,
        file_path: FsPath,
        dimension: ImageDimension,
    ) -> AppResult<ThumbFileSource> {
        let dir_name = file_path
            .parent()
            .and_then(|p| p.name())
            .ok_or_else(|| {
                AppError::validation(format!("Variant path has no parent directory: {file_path}"))
            })?;

        let qualified_name = self.owner.base().qualified_name().derived(&dir_name)?;
        let url = self
            .owner
            .base()
            .url()
            .and_then(|u| mirror_thumb_url(u, &file_path));

        let mut source = ThumbFileSource::new(
            qualified_name,
            file_path,
            dimension,
            self.mime_type,
            self.owner.file_manager_name(),
        );
        source.set_url(url);
        Ok(source)
    }
}

/// Derive a variant URL from the owner's URL by replacing the final path
/// segment with `<dimension-dir>/<file-name>`.
fn mirror_thumb_url(owner_url: &Url, thumb_path: &FsPath) -> Option<Url> {
    let dir_name = thumb_path.parent()?.name()?;
    let file_name = thumb_path.name()?;

    let mut url = owner_url.clone();
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop();
        segments.push(&dir_name);
        segments.push(&file_name);
    }
    Some(url)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use image::DynamicImage;

    use fileward_core::error::ErrorKind;
    use fileward_core::types::QualifiedName;
    use fileward_fs::FsPerm;

    use crate::source::FileSource;

    use super::*;

    fn managed_source(dir: &Path, name: &str) -> ManagedFileSource {
        ManagedFileSource::new(
            FsPath::from(dir).join(name),
            "test-manager",
            QualifiedName::new(format!("files/{name}")).unwrap(),
            FsPerm::new("0755").unwrap(),
            FsPerm::new("0644").unwrap(),
        )
    }

    fn write_owner_image(dir: &Path, name: &str) {
        DynamicImage::new_rgb8(16, 16).save(dir.join(name)).unwrap();
    }

    #[tokio::test]
    async fn test_create_writes_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        std::fs::create_dir(&files).unwrap();
        write_owner_image(&files, "photo.jpg");

        let owner = managed_source(&files, "photo.jpg");
        let engine = owner.thumb_engine().unwrap();

        let dimension = ImageDimension::new(100, 100, true);
        let resource = ImageResource::from_dynamic(DynamicImage::new_rgb8(100, 100));
        let thumb = engine.create(&resource, dimension).await.unwrap();

        let expected = files.join("~res-100x100-crop~").join("photo.jpg");
        assert_eq!(thumb.file_path().as_path(), expected.as_path());
        assert!(expected.is_file());
        assert_eq!(thumb.dimension(), dimension);
        assert_eq!(thumb.mime_type(), "image/jpeg");

        let found = engine.get_by_dimension(dimension).unwrap().unwrap();
        assert_eq!(found.file_path(), thumb.file_path());
    }

    #[tokio::test]
    async fn test_create_overwrites_leftover_variant_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        std::fs::create_dir(&files).unwrap();
        write_owner_image(&files, "photo.jpg");

        // An aborted earlier attempt can leave an empty variant file behind
        std::fs::create_dir(files.join("~res-20x20~")).unwrap();
        std::fs::write(files.join("~res-20x20~/photo.jpg"), b"").unwrap();

        let owner = managed_source(&files, "photo.jpg");
        let engine = owner.thumb_engine().unwrap();

        let resource = ImageResource::from_dynamic(DynamicImage::new_rgb8(20, 20));
        let thumb = engine
            .create(&resource, ImageDimension::new(20, 20, false))
            .await
            .unwrap();

        let loaded = ImageCodec::for_path(thumb.file_path().clone())
            .unwrap()
            .load()
            .await
            .unwrap();
        assert_eq!((loaded.width(), loaded.height()), (20, 20));
    }

    #[tokio::test]
    async fn test_get_by_dimension_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        std::fs::create_dir(&files).unwrap();
        write_owner_image(&files, "photo.jpg");

        let owner = managed_source(&files, "photo.jpg");
        let engine = owner.thumb_engine().unwrap();

        let found = engine
            .get_by_dimension(ImageDimension::new(10, 10, false))
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_possible_and_used_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        std::fs::create_dir(&files).unwrap();
        write_owner_image(&files, "photo.jpg");

        std::fs::create_dir(files.join("~res-64x64~")).unwrap();
        std::fs::write(files.join("~res-64x64~/photo.jpg"), b"").unwrap();
        std::fs::create_dir(files.join("~res-32x32-crop~")).unwrap();
        std::fs::create_dir(files.join("~res-banner~")).unwrap();
        std::fs::create_dir(files.join("archive")).unwrap();
        std::fs::write(files.join("~res-9x9~"), b"").unwrap();

        let owner = managed_source(&files, "photo.jpg");
        let engine = owner.thumb_engine().unwrap();

        let possible = engine.possible_dimensions().await.unwrap();
        assert_eq!(
            possible,
            vec![
                ImageDimension::new(32, 32, true),
                ImageDimension::new(64, 64, false),
            ]
        );

        let used = engine.used_dimensions().await.unwrap();
        assert_eq!(used, vec![ImageDimension::new(64, 64, false)]);
    }

    #[tokio::test]
    async fn test_clear_removes_only_own_variants() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        std::fs::create_dir(&files).unwrap();
        write_owner_image(&files, "photo.jpg");

        std::fs::create_dir(files.join("~res-64x64~")).unwrap();
        std::fs::write(files.join("~res-64x64~/photo.jpg"), b"").unwrap();
        std::fs::write(files.join("~res-64x64~/other.jpg"), b"").unwrap();

        let owner = managed_source(&files, "photo.jpg");
        let engine = owner.thumb_engine().unwrap();
        engine.clear().await.unwrap();

        assert!(engine.used_dimensions().await.unwrap().is_empty());
        assert!(files.join("~res-64x64~").is_dir());
        assert!(files.join("~res-64x64~/other.jpg").is_file());
        assert_eq!(
            engine.possible_dimensions().await.unwrap(),
            vec![ImageDimension::new(64, 64, false)]
        );
    }

    #[tokio::test]
    async fn test_all_keyed_by_canonical_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        std::fs::create_dir(&files).unwrap();
        write_owner_image(&files, "photo.jpg");

        for sub in ["~res-64x64~", "~res-100x100-crop~"] {
            std::fs::create_dir(files.join(sub)).unwrap();
            std::fs::write(files.join(sub).join("photo.jpg"), b"").unwrap();
        }

        let owner = managed_source(&files, "photo.jpg");
        let engine = owner.thumb_engine().unwrap();

        let all = engine.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(
            all["100x100-crop"]
                .file_path()
                .as_path()
                .ends_with("~res-100x100-crop~/photo.jpg")
        );
        assert_eq!(all["64x64"].dimension(), ImageDimension::new(64, 64, false));
    }

    #[tokio::test]
    async fn test_url_mirrored_onto_variants() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        std::fs::create_dir(&files).unwrap();
        write_owner_image(&files, "photo.jpg");

        let mut owner = managed_source(&files, "photo.jpg");
        owner.set_url(Some(
            Url::parse("https://cdn.example.com/media/photo.jpg").unwrap(),
        ));

        let engine = owner.thumb_engine().unwrap();
        let resource = ImageResource::from_dynamic(DynamicImage::new_rgb8(8, 8));
        let thumb = engine
            .create(&resource, ImageDimension::new(64, 64, false))
            .await
            .unwrap();

        assert_eq!(
            thumb.url().map(Url::as_str),
            Some("https://cdn.example.com/media/~res-64x64~/photo.jpg")
        );
    }

    #[test]
    fn test_flat_owner_path_cannot_host_variants() {
        let flat = ManagedFileSource::new(
            FsPath::new("photo.jpg"),
            "test-manager",
            QualifiedName::new("photo.jpg").unwrap(),
            FsPerm::new("0755").unwrap(),
            FsPerm::new("0644").unwrap(),
        );
        let err = flat
            .thumb_engine()
            .unwrap()
            .get_by_dimension(ImageDimension::new(4, 4, false))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_mirror_thumb_url() {
        let url = Url::parse("https://cdn.example.com/media/photo.jpg").unwrap();
        let thumb = FsPath::new("/data/files/~res-64x64~/photo.jpg");
        assert_eq!(
            mirror_thumb_url(&url, &thumb).unwrap().as_str(),
            "https://cdn.example.com/media/~res-64x64~/photo.jpg"
        );
    }
}
