//! PNG encoding of grayscale images.
//!
//! Used to save the rendered reference mask next to a report and as the
//! reference input of the embedding path.

use std::path::Path;

use image::ImageEncoder;
use plotmatch_pipeline::types::GrayImage;

/// Errors that can occur while encoding or writing a PNG.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),

    /// Writing the encoded file failed.
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for RasterError {
    fn from(err: image::ImageError) -> Self {
        Self::PngEncode(err.to_string())
    }
}

/// Encode a `GrayImage` as 8-bit grayscale PNG bytes.
///
/// # Errors
///
/// Returns [`RasterError::PngEncode`] if PNG encoding fails.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, RasterError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::L8,
    )?;
    Ok(png_bytes)
}

/// Encode `image` as PNG and write it to `path`.
///
/// # Errors
///
/// Returns [`RasterError::PngEncode`] if encoding fails and
/// [`RasterError::Io`] if the file cannot be written.
pub fn write_png(image: &GrayImage, path: &Path) -> Result<(), RasterError> {
    let bytes = encode_png(image)?;
    std::fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), "wrote PNG");
    Ok(())
}
