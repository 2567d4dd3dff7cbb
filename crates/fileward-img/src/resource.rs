//! Decoded image pixel data.

use image::DynamicImage;
use image::imageops::FilterType;

use fileward_core::error::{AppError, ErrorKind};
use fileward_core::result::AppResult;

/// Decoded image pixel data held in memory.
///
/// Resize operations are CPU-bound and synchronous; callers doing them on
/// an async runtime should wrap them in `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct ImageResource {
    image: DynamicImage,
}

impl ImageResource {
    /// Wrap an already decoded image.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decode an image from raw bytes, guessing the format from content.
    pub fn from_bytes(data: &[u8]) -> AppResult<Self> {
        let image = image::load_from_memory(data)
            .map_err(|e| AppError::with_source(ErrorKind::Codec, "Failed to decode image", e))?;
        Ok(Self { image })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Scale proportionally to the largest size that fits within the box.
    pub fn resize_to_fit(&self, width: u32, height: u32) -> ImageResource {
        Self {
            image: self.image.resize(width, height, FilterType::Lanczos3),
        }
    }

    /// Scale proportionally and center-crop so the box is filled exactly.
    pub fn resize_to_fill(&self, width: u32, height: u32) -> ImageResource {
        Self {
            image: self.image.resize_to_fill(width, height, FilterType::Lanczos3),
        }
    }

    /// Borrow the underlying image.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Take the underlying image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::ImageFormat;

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_from_bytes() {
        let resource = ImageResource::from_bytes(&png_bytes(8, 4)).unwrap();
        assert_eq!(resource.width(), 8);
        assert_eq!(resource.height(), 4);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = ImageResource::from_bytes(b"not an image").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Codec);
    }

    #[test]
    fn test_resize_to_fit_keeps_aspect() {
        let resource = ImageResource::from_dynamic(DynamicImage::new_rgb8(100, 50));
        let resized = resource.resize_to_fit(10, 10);
        assert_eq!((resized.width(), resized.height()), (10, 5));
    }

    #[test]
    fn test_resize_to_fill_is_exact() {
        let resource = ImageResource::from_dynamic(DynamicImage::new_rgb8(100, 50));
        let resized = resource.resize_to_fill(10, 10);
        assert_eq!((resized.width(), resized.height()), (10, 10));
    }
}
