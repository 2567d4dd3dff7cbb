//! MIME type resolution for image files.

use std::path::Path;

use image::ImageFormat;

/// Resolve the MIME type of a file from its extension.
pub fn resolve_mime_type(path: impl AsRef<Path>) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}

/// Check if a MIME type names an image format the codec can read and write.
pub fn is_supported_image_mime(mime_type: &str) -> bool {
    matches!(
        mime_type,
        "image/jpeg" | "image/png" | "image/gif" | "image/webp" | "image/bmp"
    )
}

/// Map a supported image MIME type to its codec format.
pub fn format_for_mime(mime_type: &str) -> Option<ImageFormat> {
    match mime_type {
        "image/jpeg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/gif" => Some(ImageFormat::Gif),
        "image/webp" => Some(ImageFormat::WebP),
        "image/bmp" => Some(ImageFormat::Bmp),
        _ => None,
    }
}
