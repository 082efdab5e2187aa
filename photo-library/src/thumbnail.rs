use crate::models::ContentMode;
use image::{imageops::FilterType, DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Background of the video placeholder tile
const PLACEHOLDER_BACKGROUND: Rgb<u8> = Rgb([44, 44, 46]);
/// Play glyph on the placeholder tile
const PLACEHOLDER_GLYPH: Rgb<u8> = Rgb([235, 235, 240]);

/// Error type for thumbnail operations
#[derive(Debug)]
pub enum ThumbnailError {
    ImageLoadError(String),
    ImageSaveError(String),
    IoError(std::io::Error),
    /// No decoder available for this media (e.g. video on desktop)
    Unsupported(String),
    TaskError(String),
}

impl std::fmt::Display for ThumbnailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThumbnailError::ImageLoadError(msg) => write!(f, "Image load error: {}", msg),
            ThumbnailError::ImageSaveError(msg) => write!(f, "Image save error: {}", msg),
            ThumbnailError::IoError(e) => write!(f, "IO error: {}", e),
            ThumbnailError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            ThumbnailError::TaskError(msg) => write!(f, "Task error: {}", msg),
        }
    }
}

impl std::error::Error for ThumbnailError {}

impl From<std::io::Error> for ThumbnailError {
    fn from(err: std::io::Error) -> Self {
        ThumbnailError::IoError(err)
    }
}

/// Encodes an image as JPEG. Alpha is dropped, the JPEG encoder rejects it.
pub fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, ThumbnailError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| ThumbnailError::ImageSaveError(format!("Failed to encode JPEG: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Renders encoded image bytes into a JPEG thumbnail with `target` as the
/// bounding edge.
pub fn render_thumbnail(
    bytes: &[u8],
    target: u32,
    mode: ContentMode,
) -> Result<Vec<u8>, ThumbnailError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ThumbnailError::ImageLoadError(format!("Failed to load image: {}", e)))?;

    let resized = match mode {
        ContentMode::AspectFit => img.resize(target, target, FilterType::Lanczos3),
        ContentMode::AspectFill => img.resize_to_fill(target, target, FilterType::Lanczos3),
    };

    log::debug!(
        "Thumbnail rendered: {}x{} -> {}x{}",
        img.width(),
        img.height(),
        resized.width(),
        resized.height()
    );

    encode_jpeg(&resized)
}

/// Same as [`render_thumbnail`], on the blocking pool
pub async fn render_thumbnail_async(
    bytes: Vec<u8>,
    target: u32,
    mode: ContentMode,
) -> Result<Vec<u8>, ThumbnailError> {
    tokio::task::spawn_blocking(move || render_thumbnail(&bytes, target, mode))
        .await
        .map_err(|e| ThumbnailError::TaskError(format!("Task join error: {}", e)))?
}

/// Generated tile for videos without a usable still: flat background with a
/// play triangle in the middle.
pub fn video_placeholder(size: u32) -> Result<Vec<u8>, ThumbnailError> {
    let size = size.max(16);
    let s = size as f32;
    let left = s * 0.38;
    let right = s * 0.66;
    let half_height = s * 0.18;
    let center_y = s / 2.0;

    let img = RgbImage::from_fn(size, size, |x, y| {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        if px < left || px > right {
            return PLACEHOLDER_BACKGROUND;
        }
        // Triangle narrows linearly towards the tip on the right
        let allowed = (right - px) * half_height / (right - left);
        if (py - center_y).abs() <= allowed {
            PLACEHOLDER_GLYPH
        } else {
            PLACEHOLDER_BACKGROUND
        }
    });

    encode_jpeg(&DynamicImage::ImageRgb8(img))
}

/// Decodes a still frame from a video file.
///
/// Platform builds plug in their native decoder.
pub trait VideoFrameSampler: Send + Sync {
    /// Frame at time zero
    fn sample_first_frame(&self, path: &Path) -> Result<DynamicImage, ThumbnailError>;
}

/// Sampler for builds without a video decoder; always fails so callers
/// substitute the placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVideoDecoder;

impl VideoFrameSampler for NoVideoDecoder {
    fn sample_first_frame(&self, path: &Path) -> Result<DynamicImage, ThumbnailError> {
        Err(ThumbnailError::Unsupported(format!(
            "No video decoder for {}",
            path.display()
        )))
    }
}
