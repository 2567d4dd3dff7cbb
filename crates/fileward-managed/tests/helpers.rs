//! Shared test helpers for managed file source tests.

use std::path::Path;

use image::DynamicImage;

use fileward_core::types::QualifiedName;
use fileward_fs::{FsPath, FsPerm};
use fileward_managed::ManagedFileSource;

/// Write a small owner image and wrap it in a managed source.
pub fn managed_image(dir: &Path, name: &str) -> ManagedFileSource {
    DynamicImage::new_rgb8(16, 16).save(dir.join(name)).unwrap();
    managed_source(dir, name)
}

/// Wrap a file in the given directory in a managed source.
pub fn managed_source(dir: &Path, name: &str) -> ManagedFileSource {
    ManagedFileSource::new(
        FsPath::from(dir).join(name),
        "test-manager",
        QualifiedName::new(format!("files/{name}")).unwrap(),
        FsPerm::new("0755").unwrap(),
        FsPerm::new("0644").unwrap(),
    )
}
