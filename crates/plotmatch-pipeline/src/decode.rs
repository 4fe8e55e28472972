//! Decode candidate rasters into binary masks.
//!
//! Candidates arrive either as numeric text (one raster row per line,
//! values separated by whitespace) or as an encoded image (PNG, JPEG,
//! BMP, WebP). Both are decoded to a grayscale grid, resized with
//! nearest-neighbor sampling when the shape differs from the target, and
//! thresholded so every positive value becomes foreground.

use image::imageops::FilterType;

use crate::mask::Mask;
use crate::types::{DecodeError, GrayImage};

/// Raw bytes of a candidate raster, tagged with how to interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterInput {
    /// Whitespace-delimited numeric rows. Blank lines and lines starting
    /// with `#` are ignored.
    Text(Vec<u8>),
    /// An encoded image the `image` crate can decode.
    Image(Vec<u8>),
}

/// Something that can produce the raw bytes of one candidate raster.
///
/// The ranking engine calls [`read`](Self::read) lazily, one candidate at
/// a time, so sources backed by files only hold one raster in memory.
pub trait RasterSource {
    /// Fetch the raster bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the bytes cannot be obtained.
    fn read(&self) -> Result<RasterInput, DecodeError>;
}

impl RasterSource for RasterInput {
    fn read(&self) -> Result<RasterInput, DecodeError> {
        Ok(self.clone())
    }
}

impl<S: RasterSource + ?Sized> RasterSource for Box<S> {
    fn read(&self) -> Result<RasterInput, DecodeError> {
        (**self).read()
    }
}

/// Decode a raster into a binary mask of side `target_size`.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the input is empty, malformed, or not a
/// decodable image.
pub fn decode_raster(input: &RasterInput, target_size: u32) -> Result<Mask, DecodeError> {
    let gray = match input {
        RasterInput::Text(bytes) => parse_text_grid(bytes)?,
        RasterInput::Image(bytes) => decode_image(bytes)?,
    };
    Ok(Mask::from_gray(resize_nearest(gray, target_size)))
}

/// Decode a whitespace-delimited numeric raster into a mask.
///
/// # Errors
///
/// See [`decode_raster`].
pub fn decode_text_raster(bytes: &[u8], target_size: u32) -> Result<Mask, DecodeError> {
    let gray = parse_text_grid(bytes)?;
    Ok(Mask::from_gray(resize_nearest(gray, target_size)))
}

/// Decode an encoded image into a mask. Every non-black pixel becomes
/// foreground.
///
/// # Errors
///
/// See [`decode_raster`].
pub fn decode_image_raster(bytes: &[u8], target_size: u32) -> Result<Mask, DecodeError> {
    let gray = decode_image(bytes)?;
    Ok(Mask::from_gray(resize_nearest(gray, target_size)))
}

/// Decode a raster into a displayable grayscale image at its native size.
///
/// Text rasters render like [`Mask::to_gray_image`]: positive values as a
/// black (0) shape on a white (255) background. Used by the embedding
/// path, which consumes images rather than masks.
///
/// # Errors
///
/// See [`decode_raster`].
pub fn decode_gray(input: &RasterInput) -> Result<GrayImage, DecodeError> {
    match input {
        RasterInput::Text(bytes) => {
            let mut gray = parse_text_grid(bytes)?;
            for pixel in gray.pixels_mut() {
                pixel.0[0] = if pixel.0[0] > 0 { 0 } else { 255 };
            }
            Ok(gray)
        }
        RasterInput::Image(bytes) => decode_image(bytes),
    }
}

/// Decode encoded image bytes to 8-bit grayscale.
fn decode_image(bytes: &[u8]) -> Result<GrayImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyRaster);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}

/// Resize to `size × size` with nearest-neighbor sampling, skipping the
/// copy when the shape already matches.
fn resize_nearest(gray: GrayImage, size: u32) -> GrayImage {
    if gray.dimensions() == (size, size) {
        return gray;
    }
    image::imageops::resize(&gray, size, size, FilterType::Nearest)
}

/// Parse numeric text into a grid where each positive value is `1` and
/// everything else `0`.
fn parse_text_grid(bytes: &[u8]) -> Result<GrayImage, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::Malformed {
        line: 0,
        reason: format!("not valid UTF-8: {e}"),
    })?;

    let mut width: Option<usize> = None;
    let mut rows = 0usize;
    let mut pixels: Vec<u8> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let start = pixels.len();
        for token in trimmed.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| DecodeError::Malformed {
                line: line_no,
                reason: format!("`{token}` is not a number"),
            })?;
            if !value.is_finite() {
                return Err(DecodeError::Malformed {
                    line: line_no,
                    reason: format!("`{token}` is not finite"),
                });
            }
            pixels.push(u8::from(value > 0.0));
        }

        let found = pixels.len() - start;
        match width {
            None => width = Some(found),
            Some(expected) if expected != found => {
                return Err(DecodeError::RaggedRows {
                    line: line_no,
                    expected,
                    found,
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    let Some(width) = width else {
        return Err(DecodeError::EmptyRaster);
    };
    let width = u32::try_from(width).map_err(|_| DecodeError::TooLarge)?;
    let height = u32::try_from(rows).map_err(|_| DecodeError::TooLarge)?;
    GrayImage::from_raw(width, height, pixels).ok_or(DecodeError::TooLarge)
}
