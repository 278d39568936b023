mod support;

use image::{DynamicImage, ImageFormat, RgbImage};
use serverless_kit::{
    config::ResizeConfig,
    models::{
        event::{S3Event, S3EventRecord},
        object::ObjectRef,
    },
    services::{
        object_store::ObjectStoreError,
        thumbnail::{ResizeError, ResizeSummary, ThumbnailHandler},
    },
};
use std::{collections::HashSet, io::Cursor};
use support::object_store::MemoryObjectStore;
use tempfile::TempDir;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 255) as u8, (y % 255) as u8, 40])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn handler(scratch: &TempDir) -> ThumbnailHandler<MemoryObjectStore> {
    let config = ResizeConfig {
        output_bucket: "usermedia-output".into(),
        target_size: 200,
        scratch_dir: scratch.path().to_path_buf(),
    };
    ThumbnailHandler::new(MemoryObjectStore::new(), config)
}

#[tokio::test]
async fn each_record_gets_its_own_workspace_and_upload() {
    let scratch = TempDir::new().unwrap();
    let handler = handler(&scratch);
    handler
        .store()
        .put(ObjectRef::new("usermedia-input", "avatars/cat.png"), png_bytes(640, 480));
    handler
        .store()
        .put(ObjectRef::new("usermedia-input", "dog.png"), png_bytes(120, 300));

    let event = S3Event {
        records: vec![
            S3EventRecord::new("usermedia-input", "avatars/cat.png"),
            S3EventRecord::new("usermedia-input", "dog.png"),
        ],
    };

    let outcomes = handler.handle_event(&event).await.unwrap();
    assert_eq!(outcomes.len(), 2);

    for (outcome, key) in outcomes.iter().zip(["avatars/cat.png", "dog.png"]) {
        assert_eq!(outcome.destination, ObjectRef::new("usermedia-output", key));
        assert_eq!((outcome.width, outcome.height), (200, 200));

        let uploaded = handler.store().get(&outcome.destination).unwrap();
        let thumb = image::load_from_memory(&uploaded).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (200, 200));
    }

    // Distinct staging paths, each under its own directory, all cleaned up.
    let downloads = handler.store().download_paths();
    assert_eq!(downloads.len(), 2);
    let unique: HashSet<_> = downloads.iter().collect();
    assert_eq!(unique.len(), 2);
    let parents: HashSet<_> = downloads.iter().map(|p| p.parent().unwrap()).collect();
    assert_eq!(parents.len(), 2);
    for path in &downloads {
        assert!(path.starts_with(scratch.path()));
        assert!(!path.exists(), "{} should have been removed", path.display());
        assert!(!path.parent().unwrap().exists());
    }
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn repeated_invocations_never_reuse_a_path() {
    let scratch = TempDir::new().unwrap();
    let handler = handler(&scratch);
    handler
        .store()
        .put(ObjectRef::new("in", "same.png"), png_bytes(50, 50));
    let event = S3Event {
        records: vec![S3EventRecord::new("in", "same.png")],
    };

    handler.handle_event(&event).await.unwrap();
    handler.handle_event(&event).await.unwrap();

    let downloads = handler.store().download_paths();
    assert_eq!(downloads.len(), 2);
    assert_ne!(downloads[0], downloads[1]);
    for path in &downloads {
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("-same.png"), "unexpected staging name {name}");
    }
}

#[tokio::test]
async fn missing_object_propagates_and_cleans_up() {
    let scratch = TempDir::new().unwrap();
    let handler = handler(&scratch);
    let event = S3Event {
        records: vec![S3EventRecord::new("in", "ghost.png")],
    };

    let err = handler.handle_event(&event).await.unwrap_err();
    assert!(matches!(
        err,
        ResizeError::Storage(ObjectStoreError::NotFound(_))
    ));
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn corrupt_image_stops_the_batch() {
    let scratch = TempDir::new().unwrap();
    let handler = handler(&scratch);
    handler
        .store()
        .put(ObjectRef::new("in", "broken.png"), b"not an image".to_vec());
    handler
        .store()
        .put(ObjectRef::new("in", "fine.png"), png_bytes(10, 10));
    let event = S3Event {
        records: vec![
            S3EventRecord::new("in", "broken.png"),
            S3EventRecord::new("in", "fine.png"),
        ],
    };

    let err = handler.handle_event(&event).await.unwrap_err();
    assert!(matches!(err, ResizeError::Image(_)));
    assert!(
        handler
            .store()
            .get(&ObjectRef::new("usermedia-output", "fine.png"))
            .is_none()
    );
}

#[tokio::test]
async fn empty_event_is_a_noop() {
    let scratch = TempDir::new().unwrap();
    let handler = handler(&scratch);
    let outcomes = handler.handle_event(&S3Event::default()).await.unwrap();
    let summary = ResizeSummary::from(outcomes.as_slice());
    assert_eq!(summary.processed, 0);
    assert!(summary.outputs.is_empty());
}
