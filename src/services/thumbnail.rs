//! Storage-triggered thumbnail generation.
//!
//! For every record in an [`S3Event`] the handler downloads the new object
//! into a private scratch directory, crops it to a square thumbnail and
//! uploads the result to the configured output bucket under the same key.
//! Failures are not caught here; they surface to whatever invoked
//! [`ThumbnailHandler::handle_event`].

use crate::{
    config::ResizeConfig,
    models::{
        event::{S3Event, S3EventRecord},
        object::ObjectRef,
    },
    services::object_store::{ObjectStore, ObjectStoreError},
};
use image::{ImageFormat, ImageReader, imageops::FilterType};
use serde::Serialize;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ResizeError {
    #[error(transparent)]
    Storage(#[from] ObjectStoreError),
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("resize task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What happened to one record.
#[derive(Debug, Clone, Serialize)]
pub struct ThumbnailOutcome {
    pub source: ObjectRef,
    pub destination: ObjectRef,
    /// Where the original was staged; gone once the outcome is returned.
    pub download_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

/// Response body returned to the function runtime.
#[derive(Debug, Clone, Serialize)]
pub struct ResizeSummary {
    pub processed: usize,
    pub outputs: Vec<ObjectRef>,
}

impl From<&[ThumbnailOutcome]> for ResizeSummary {
    fn from(outcomes: &[ThumbnailOutcome]) -> Self {
        Self {
            processed: outcomes.len(),
            outputs: outcomes.iter().map(|o| o.destination.clone()).collect(),
        }
    }
}

pub struct ThumbnailHandler<S> {
    store: S,
    config: ResizeConfig,
}

impl<S: ObjectStore> ThumbnailHandler<S> {
    pub fn new(store: S, config: ResizeConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process every record in order, stopping at the first failure.
    pub async fn handle_event(
        &self,
        event: &S3Event,
    ) -> Result<Vec<ThumbnailOutcome>, ResizeError> {
        let mut outcomes = Vec::with_capacity(event.records.len());
        for record in &event.records {
            outcomes.push(self.process_record(record).await?);
        }
        Ok(outcomes)
    }

    async fn process_record(
        &self,
        record: &S3EventRecord,
    ) -> Result<ThumbnailOutcome, ResizeError> {
        let source = record.object_ref();
        let destination = source.in_bucket(&self.config.output_bucket);

        // Removed on drop, including when one of the steps below fails.
        let token = Uuid::new_v4();
        let workspace = tempfile::Builder::new()
            .prefix(&format!("resize-{token}-"))
            .tempdir_in(&self.config.scratch_dir)?;

        let file_name = source.file_name();
        let download_path = workspace.path().join(format!("{token}-{file_name}"));
        let resized_path = workspace.path().join(format!("resized-{file_name}"));

        self.store.download(&source, &download_path).await?;

        let size = self.config.target_size;
        let (src, dst) = (download_path.clone(), resized_path.clone());
        let (width, height) =
            tokio::task::spawn_blocking(move || resize_image(&src, &dst, size)).await??;

        let receipt = self.store.upload(&resized_path, &destination).await?;
        info!(
            source = %source,
            destination = %destination,
            width,
            height,
            bytes = receipt.size,
            "thumbnail written"
        );

        Ok(ThumbnailOutcome {
            source,
            destination,
            download_path,
            width,
            height,
            bytes: receipt.size,
        })
    }
}

/// Crop-and-scale `src` to exactly `size`×`size` and write it to `dst`.
///
/// The output format follows `dst`'s extension, falling back to the format
/// detected in the input. Returns the written dimensions.
pub fn resize_image(src: &Path, dst: &Path, size: u32) -> Result<(u32, u32), ResizeError> {
    let reader = ImageReader::open(src)?.with_guessed_format()?;
    let detected = reader.format();
    let image = reader.decode()?;

    let thumb = image.resize_to_fill(size, size, FilterType::Lanczos3);
    let format = [ImageFormat::from_path(dst).ok(), detected]
        .into_iter()
        .flatten()
        .find(ImageFormat::writing_enabled)
        .unwrap_or(ImageFormat::Png);

    match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => thumb.to_rgb8().save_with_format(dst, format)?,
        _ => thumb.save_with_format(dst, format)?,
    }

    Ok((thumb.width(), thumb.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use tempfile::TempDir;

    fn write_image(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 128]));
        DynamicImage::ImageRgb8(img).save(path).unwrap();
    }

    #[test]
    fn resize_fills_square_from_landscape() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("wide.png");
        let dst = dir.path().join("thumb.png");
        write_image(&src, 400, 250);

        let dims = resize_image(&src, &dst, 200).unwrap();
        assert_eq!(dims, (200, 200));

        let written = image::open(&dst).unwrap();
        assert_eq!((written.width(), written.height()), (200, 200));
    }

    #[test]
    fn resize_uses_detected_format_without_extension() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("source.png");
        write_image(&src, 64, 128);
        let unnamed = dir.path().join("upload");
        std::fs::copy(&src, &unnamed).unwrap();
        let dst = dir.path().join("resized-upload");

        resize_image(&unnamed, &dst, 32).unwrap();
        assert_eq!(written_format(&dst), Some(ImageFormat::Png));
    }

    fn written_format(path: &Path) -> Option<ImageFormat> {
        ImageReader::open(path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format()
    }

    #[test]
    fn destination_extension_picks_output_format() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("scan.png");
        write_image(&src, 80, 40);

        let tif = dir.path().join("resized-scan.tif");
        assert_eq!(resize_image(&src, &tif, 20).unwrap(), (20, 20));
        assert_eq!(written_format(&tif), Some(ImageFormat::Tiff));

        let bmp = dir.path().join("resized-photo.bmp");
        assert_eq!(resize_image(&src, &bmp, 20).unwrap(), (20, 20));
        assert_eq!(written_format(&bmp), Some(ImageFormat::Bmp));
    }

    #[test]
    fn extension_without_encoder_falls_back_to_input_format() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("texture.png");
        write_image(&src, 30, 30);
        let dst = dir.path().join("resized-texture.dds");

        assert_eq!(resize_image(&src, &dst, 16).unwrap(), (16, 16));
        assert_eq!(written_format(&dst), Some(ImageFormat::Png));
    }

    #[test]
    fn corrupt_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("broken.png");
        std::fs::write(&src, b"definitely not a png").unwrap();

        let err = resize_image(&src, &dir.path().join("out.png"), 200).unwrap_err();
        assert!(matches!(err, ResizeError::Image(_)));
    }
}
