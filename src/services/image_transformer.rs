//! Thumbnail generation.
//!
//! Scales an image down to a bounded width while keeping its aspect ratio.
//! Images already narrower than the target are re-encoded at their original
//! size, never enlarged. The output format follows the file extension, so a
//! `.png` source yields a `.png` thumbnail; without an extension the decoded
//! format is reused.
//!
//! Decoding and encoding are CPU-bound and run on the blocking thread pool.

use crate::{
    errors::PipelineError,
    models::artifact::{ArtifactKind, LocalArtifact},
};
use image::{GenericImageView, ImageFormat, imageops::FilterType, io::Reader as ImageReader};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 300;
pub const THUMBNAIL_SUFFIX: &str = "_thumbnail";

#[derive(Clone, Copy, Debug)]
pub struct ImageTransformer {
    target_width: u32,
}

impl Default for ImageTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_WIDTH)
    }
}

impl ImageTransformer {
    pub fn new(target_width: u32) -> Self {
        Self {
            target_width: target_width.max(1),
        }
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    /// Write `<dir>/<name>_thumbnail<ext>` next to `source`.
    pub async fn resize(&self, source: &LocalArtifact) -> Result<LocalArtifact, PipelineError> {
        let source_path = source.path().to_path_buf();
        let thumbnail_path = thumbnail_path_for(&source_path)?;
        let target_width = self.target_width;

        let output = thumbnail_path.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            render_thumbnail(&source_path, &output, target_width)
        })
        .await
        .map_err(|e| PipelineError::Transform(format!("thumbnail task panicked: {e}")))?;

        match rendered {
            Ok((width, height)) => {
                info!(
                    path = %thumbnail_path.display(),
                    width,
                    height,
                    "thumbnail created"
                );
                Ok(LocalArtifact::new(thumbnail_path, ArtifactKind::Thumbnail))
            }
            Err(err) => {
                // The encoder may have left a truncated file.
                let _ = fs::remove_file(&thumbnail_path).await;
                Err(err)
            }
        }
    }
}

/// `/tmp/600_0985.jpg` -> `/tmp/600_0985_thumbnail.jpg`.
pub fn thumbnail_path_for(source: &Path) -> Result<PathBuf, PipelineError> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            PipelineError::Transform(format!("{} has no file name", source.display()))
        })?;
    let name = match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{THUMBNAIL_SUFFIX}.{ext}"),
        None => format!("{stem}{THUMBNAIL_SUFFIX}"),
    };
    Ok(source.with_file_name(name))
}

/// Dimensions of the thumbnail: width capped at `target_width`, height
/// scaled proportionally, never larger than the original.
pub fn scaled_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    if width <= target_width {
        return (width, height);
    }
    let ratio = target_width as f64 / width as f64;
    let scaled_height = ((height as f64) * ratio).round() as u32;
    (target_width, scaled_height.max(1))
}

fn render_thumbnail(
    source: &Path,
    output: &Path,
    target_width: u32,
) -> Result<(u32, u32), PipelineError> {
    let unreadable =
        |e: &dyn std::fmt::Display| PipelineError::Transform(format!("{}: {e}", source.display()));

    let reader = ImageReader::open(source)
        .map_err(|e| unreadable(&e))?
        .with_guessed_format()
        .map_err(|e| unreadable(&e))?;
    let source_format = reader.format();
    let img = reader.decode().map_err(|e| unreadable(&e))?;

    let (orig_w, orig_h) = img.dimensions();
    let (new_w, new_h) = scaled_dimensions(orig_w, orig_h, target_width);
    debug!(
        original_width = orig_w,
        original_height = orig_h,
        width = new_w,
        height = new_h,
        "resizing image"
    );

    let thumbnail = if (new_w, new_h) == (orig_w, orig_h) {
        img
    } else {
        img.resize_exact(new_w, new_h, FilterType::Lanczos3)
    };

    let format = ImageFormat::from_path(output)
        .ok()
        .or(source_format)
        .ok_or_else(|| {
            PipelineError::Transform(format!("no output format for {}", output.display()))
        })?;
    thumbnail.save_with_format(output, format).map_err(|e| {
        PipelineError::Transform(format!("writing {} failed: {e}", output.display()))
    })?;

    Ok((new_w, new_h))
}
