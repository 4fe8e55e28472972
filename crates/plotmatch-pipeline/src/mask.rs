//! Binary masks and the four rigid flip transforms.
//!
//! A [`Mask`] wraps a [`GrayImage`] whose pixels are strictly `0`
//! (background) or `1` (foreground). Masks are immutable: a
//! [`Transform`] produces a new mask rather than flipping in place.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::GrayImage;

/// Background pixel value.
const BACKGROUND: u8 = 0;
/// Foreground pixel value.
const FOREGROUND: u8 = 1;

/// A binary raster mask with values in `{0, 1}`.
///
/// An all-zero mask is valid but degenerate (e.g. a polygon with fewer
/// than three vertices).
#[derive(Debug, Clone)]
pub struct Mask(GrayImage);

impl Mask {
    /// An all-zero square mask of side `size`.
    #[must_use]
    pub fn empty(size: u32) -> Self {
        Self(GrayImage::new(size, size))
    }

    /// Threshold any grayscale image into a mask: every positive pixel
    /// becomes foreground.
    #[must_use]
    pub fn from_gray(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            pixel.0[0] = if pixel.0[0] > 0 { FOREGROUND } else { BACKGROUND };
        }
        Self(image)
    }

    /// Wrap a raster already known to hold only `0`/`1`.
    pub(crate) const fn from_binary(image: GrayImage) -> Self {
        Self(image)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// `(width, height)` in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Whether the pixel at `(x, y)` is foreground. Out-of-bounds
    /// coordinates read as background.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.0
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] == FOREGROUND)
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn foreground_count(&self) -> u64 {
        self.0.as_raw().iter().map(|&v| u64::from(v)).sum()
    }

    /// Returns `true` if at least one pixel is foreground.
    #[must_use]
    pub fn has_foreground(&self) -> bool {
        self.0.as_raw().contains(&FOREGROUND)
    }

    /// Borrow the raw `0`/`1` raster.
    #[must_use]
    pub const fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    /// Raw `0`/`1` pixel values in row-major order.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        self.0.as_raw()
    }

    /// Render as a displayable grayscale image: black shape (0) on a
    /// white (255) background.
    #[must_use]
    pub fn to_gray_image(&self) -> GrayImage {
        let mut out = self.0.clone();
        for pixel in out.pixels_mut() {
            pixel.0[0] = if pixel.0[0] == FOREGROUND { 0 } else { 255 };
        }
        out
    }

    /// Apply a rigid transform, producing a new mask.
    #[must_use]
    pub fn transformed(&self, transform: Transform) -> Self {
        let image = match transform {
            Transform::Identity => self.0.clone(),
            Transform::FlipHorizontal => image::imageops::flip_horizontal(&self.0),
            Transform::FlipVertical => image::imageops::flip_vertical(&self.0),
            Transform::FlipBoth => image::imageops::rotate180(&self.0),
        };
        Self(image)
    }
}

impl PartialEq for Mask {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions() && self.as_raw() == other.as_raw()
    }
}

impl Eq for Mask {}

/// One of the four rigid transforms tried against every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transform {
    /// No change.
    #[serde(rename = "Original")]
    Identity,
    /// Mirror left-right (reverse each row).
    #[serde(rename = "Flipped Horizontally")]
    FlipHorizontal,
    /// Mirror top-bottom (reverse the row order).
    #[serde(rename = "Flipped Vertically")]
    FlipVertical,
    /// Both mirrors, equivalent to a 180° rotation.
    #[serde(rename = "Flipped Both")]
    FlipBoth,
}

impl Transform {
    /// All transforms in evaluation order. Ties during scoring go to the
    /// earliest entry.
    pub const ALL: [Self; 4] = [
        Self::Identity,
        Self::FlipHorizontal,
        Self::FlipVertical,
        Self::FlipBoth,
    ];

    /// Human-readable label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Identity => "Original",
            Self::FlipHorizontal => "Flipped Horizontally",
            Self::FlipVertical => "Flipped Vertically",
            Self::FlipBoth => "Flipped Both",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
