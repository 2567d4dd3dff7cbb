//! Integration tests for the thumb engine.

mod helpers;

use image::DynamicImage;

use fileward_img::{ImageCodec, ImageResource};
use fileward_managed::{FileSource, ImageDimension};

#[tokio::test]
async fn test_full_variant_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let files = dir.path().join("files");
    std::fs::create_dir(&files).unwrap();

    let owner = helpers::managed_image(&files, "photo.jpg");
    let engine = owner.thumb_engine().unwrap();

    let dimension: ImageDimension = "100x100-crop".parse().unwrap();
    assert!(engine.get_by_dimension(dimension).unwrap().is_none());

    let prepared =
        ImageResource::from_dynamic(DynamicImage::new_rgb8(240, 160)).resize_to_fill(100, 100);
    let thumb = engine.create(&prepared, dimension).await.unwrap();

    assert_eq!(
        thumb.file_path().as_path(),
        files.join("~res-100x100-crop~").join("photo.jpg").as_path()
    );
    assert_eq!(thumb.dimension(), dimension);
    assert!(thumb.is_managed());

    let loaded = ImageCodec::for_path(thumb.file_path().clone())
        .unwrap()
        .load()
        .await
        .unwrap();
    assert_eq!((loaded.width(), loaded.height()), (100, 100));

    assert_eq!(engine.used_dimensions().await.unwrap(), vec![dimension]);
    assert_eq!(engine.possible_dimensions().await.unwrap(), vec![dimension]);

    let found = engine.get_by_dimension(dimension).unwrap().unwrap();
    assert_eq!(found.file_path(), thumb.file_path());
    assert_eq!(found.qualified_name(), thumb.qualified_name());

    let all = engine.all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all.contains_key("100x100-crop"));

    engine.clear().await.unwrap();
    assert!(engine.used_dimensions().await.unwrap().is_empty());
    assert!(engine.get_by_dimension(dimension).unwrap().is_none());
    // The emptied variant directory still advertises the dimension
    assert_eq!(engine.possible_dimensions().await.unwrap(), vec![dimension]);
}

#[tokio::test]
async fn test_create_replaces_an_existing_variant() {
    let dir = tempfile::tempdir().unwrap();
    let files = dir.path().join("files");
    std::fs::create_dir(&files).unwrap();

    let owner = helpers::managed_image(&files, "photo.jpg");
    let engine = owner.thumb_engine().unwrap();
    let dimension = ImageDimension::new(64, 64, false);

    let stale = ImageResource::from_dynamic(DynamicImage::new_rgb8(8, 8));
    engine.create(&stale, dimension).await.unwrap();

    let fresh = ImageResource::from_dynamic(DynamicImage::new_rgb8(32, 32));
    let thumb = engine.create(&fresh, dimension).await.unwrap();

    let loaded = ImageCodec::for_path(thumb.file_path().clone())
        .unwrap()
        .load()
        .await
        .unwrap();
    assert_eq!((loaded.width(), loaded.height()), (32, 32));
    assert_eq!(engine.used_dimensions().await.unwrap(), vec![dimension]);
}

#[tokio::test]
async fn test_concurrent_create_yields_one_variant() {
    let dir = tempfile::tempdir().unwrap();
    let files = dir.path().join("files");
    std::fs::create_dir(&files).unwrap();

    let owner = helpers::managed_image(&files, "photo.jpg");
    let engine = owner.thumb_engine().unwrap();

    let dimension = ImageDimension::new(32, 32, false);
    let resource = ImageResource::from_dynamic(DynamicImage::new_rgb8(32, 32));

    let (first, second) = tokio::join!(
        engine.create(&resource, dimension),
        engine.create(&resource, dimension),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.file_path(), second.file_path());
    assert!(first.file_path().is_file());
    assert_eq!(engine.used_dimensions().await.unwrap(), vec![dimension]);

    // The file the loser observed is complete and decodable
    let loaded = ImageCodec::for_path(second.file_path().clone())
        .unwrap()
        .load()
        .await
        .unwrap();
    assert_eq!((loaded.width(), loaded.height()), (32, 32));
}

#[tokio::test]
async fn test_variants_are_isolated_per_owner() {
    let dir = tempfile::tempdir().unwrap();
    let files = dir.path().join("files");
    std::fs::create_dir(&files).unwrap();

    let photo = helpers::managed_image(&files, "photo.jpg");
    let banner = helpers::managed_image(&files, "banner.jpg");

    let dimension = ImageDimension::new(64, 64, false);
    let resource = ImageResource::from_dynamic(DynamicImage::new_rgb8(64, 64));

    photo
        .thumb_engine()
        .unwrap()
        .create(&resource, dimension)
        .await
        .unwrap();

    // The sibling owner sees the dimension directory but holds no variant
    let banner_engine = banner.thumb_engine().unwrap();
    assert!(banner_engine.used_dimensions().await.unwrap().is_empty());
    assert_eq!(
        banner_engine.possible_dimensions().await.unwrap(),
        vec![dimension]
    );
    assert!(banner_engine.get_by_dimension(dimension).unwrap().is_none());

    banner_engine.clear().await.unwrap();
    let photo_engine = photo.thumb_engine().unwrap();
    assert_eq!(photo_engine.used_dimensions().await.unwrap(), vec![dimension]);
}
