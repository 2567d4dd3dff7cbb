//! Reading and writing image files in the format their path implies.

use std::io::Cursor;

use image::ImageFormat;
use tracing::debug;

use fileward_core::error::{AppError, ErrorKind};
use fileward_core::result::AppResult;
use fileward_fs::FsPath;

use crate::mime::{format_for_mime, resolve_mime_type};
use crate::resource::ImageResource;

/// Encodes and decodes the image file at a fixed path.
///
/// The codec format is inferred from the file extension once, at
/// construction. Encoding and decoding run on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    path: FsPath,
    format: ImageFormat,
}

impl ImageCodec {
    /// Create a codec for the given path.
    ///
    /// Fails if the extension does not resolve to a MIME type the codec
    /// supports.
    pub fn for_path(path: FsPath) -> AppResult<Self> {
        let mime = resolve_mime_type(&path)
            .ok_or_else(|| AppError::codec(format!("No image codec for file: {path}")))?;
        let format = format_for_mime(mime)
            .ok_or_else(|| AppError::codec(format!("No image codec for MIME type: {mime}")))?;
        Ok(Self { path, format })
    }

    /// The file path this codec reads and writes.
    pub fn path(&self) -> &FsPath {
        &self.path
    }

    /// The codec format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Read and decode the image file.
    pub async fn load(&self) -> AppResult<ImageResource> {
        let data = tokio::fs::read(self.path.as_path()).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read image file: {}", self.path),
                e,
            )
        })?;

        let format = self.format;
        let path = self.path.clone();
        let image = tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&data, format).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Codec,
                    format!("Failed to decode image: {path}"),
                    e,
                )
            })
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Codec, "Image decode task panicked", e))??;

        Ok(ImageResource::from_dynamic(image))
    }

    /// Encode the image and write it to the file.
    pub async fn save(&self, resource: &ImageResource) -> AppResult<()> {
        let format = self.format;
        let image = resource.as_dynamic().clone();
        let path = self.path.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            let mut buf = Cursor::new(Vec::new());
            image.write_to(&mut buf, format).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Codec,
                    format!("Failed to encode image: {path}"),
                    e,
                )
            })?;
            Ok::<_, AppError>(buf.into_inner())
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Codec, "Image encode task panicked", e))??;

        tokio::fs::write(self.path.as_path(), &encoded).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write image file: {}", self.path),
                e,
            )
        })?;

        debug!(path = %self.path, bytes = encoded.len(), "Wrote image file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::DynamicImage;

    use super::*;

    #[tokio::test]
    async fn test_png_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = FsPath::from(dir.path()).join("small.png");

        let codec = ImageCodec::for_path(path.clone()).unwrap();
        assert_eq!(codec.format(), ImageFormat::Png);

        let resource = ImageResource::from_dynamic(DynamicImage::new_rgb8(6, 3));
        codec.save(&resource).await.unwrap();
        assert!(path.is_file());

        let loaded = codec.load().await.unwrap();
        assert_eq!((loaded.width(), loaded.height()), (6, 3));
    }

    #[test]
    fn test_for_path_rejects_non_image() {
        let err = ImageCodec::for_path(FsPath::new("notes.txt")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Codec);

        let err = ImageCodec::for_path(FsPath::new("mystery.zzz")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Codec);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = FsPath::from(dir.path()).join("absent.jpg");

        let codec = ImageCodec::for_path(path).unwrap();
        let err = codec.load().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }
}
