//! Shared types for the plotmatch shape-matching pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// raster data without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point.
///
/// Used both for raw polygon coordinates (arbitrary scale and origin)
/// and for pixel-space contour points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A polygon whose coordinates all lie in the unit square `[0, 1]²`.
///
/// Always holds at least one point: the only constructors are
/// [`normalize`](crate::normalize::normalize), [`pad`](crate::normalize::pad),
/// and [`NormalizedPolygon::new`], all of which reject empty input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPolygon(Vec<Point>);

impl NormalizedPolygon {
    /// Wrap points that are already normalized.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EmptyInput`] if `points` is empty, and
    /// [`InputError::InvalidConfig`] if any coordinate falls outside
    /// `[0, 1]` or is not finite.
    pub fn new(points: Vec<Point>) -> Result<Self, InputError> {
        if points.is_empty() {
            return Err(InputError::EmptyInput);
        }
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if let Some(bad) = points.iter().find(|p| !in_unit(p.x) || !in_unit(p.y)) {
            return Err(InputError::InvalidConfig(format!(
                "normalized point ({}, {}) lies outside the unit square",
                bad.x, bad.y
            )));
        }
        Ok(Self(points))
    }

    /// Crate-internal constructor for callers that have already
    /// established the non-empty and in-range invariants.
    pub(crate) const fn from_unchecked(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns the number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// Ordered boundary points of the largest foreground region of a mask.
///
/// Empty when the mask has no foreground.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a new contour from boundary points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// Configuration accepted by every matching entry point.
///
/// Passed explicitly; nothing is read from process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Side length in pixels of every mask (reference and candidates).
    pub image_size: u32,

    /// Fraction of the raster left empty on each side of the reference
    /// shape. `0.5` or more collapses the shape to the center point.
    pub padding_ratio: f64,

    /// IoU margin within which the vertical flip is reported as the
    /// winning transform.
    pub iou_tolerance: f64,

    /// Hausdorff margin (pixels) within which the vertical flip is
    /// reported as the winning transform.
    pub hausdorff_tolerance: f64,
}

impl MatchConfig {
    /// Default mask side length.
    pub const DEFAULT_IMAGE_SIZE: u32 = 500;
    /// Default padding ratio.
    pub const DEFAULT_PADDING_RATIO: f64 = 0.05;
    /// Default IoU prioritization tolerance.
    pub const DEFAULT_IOU_TOLERANCE: f64 = 0.01;
    /// Default Hausdorff prioritization tolerance.
    pub const DEFAULT_HAUSDORFF_TOLERANCE: f64 = 2.0;

    /// Check the configuration for values no entry point can work with.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidConfig`] if `image_size` is zero, or
    /// if the padding ratio or either tolerance is negative or not finite.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.image_size == 0 {
            return Err(InputError::InvalidConfig(
                "image_size must be at least 1".to_owned(),
            ));
        }
        let fields = [
            ("padding_ratio", self.padding_ratio),
            ("iou_tolerance", self.iou_tolerance),
            ("hausdorff_tolerance", self.hausdorff_tolerance),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(InputError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            image_size: Self::DEFAULT_IMAGE_SIZE,
            padding_ratio: Self::DEFAULT_PADDING_RATIO,
            iou_tolerance: Self::DEFAULT_IOU_TOLERANCE,
            hausdorff_tolerance: Self::DEFAULT_HAUSDORFF_TOLERANCE,
        }
    }
}

/// Errors in the request itself: bad geometry, bad configuration, or a
/// reference that cannot be rasterized. Aborts the single request.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// No coordinates were supplied.
    #[error("input coordinates are empty")]
    EmptyInput,

    /// A coordinate is NaN or infinite.
    #[error("input coordinate ({x}, {y}) is not finite")]
    NonFiniteCoordinate {
        /// Horizontal component as supplied.
        x: f64,
        /// Vertical component as supplied.
        y: f64,
    },

    /// The geometry kind has no usable boundary.
    #[error("unsupported geometry kind: {kind}")]
    UnsupportedGeometry {
        /// Name of the geometry kind that was rejected.
        kind: &'static str,
    },

    /// The chosen feature index does not exist.
    #[error("feature index {index} is out of range (0..{len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of available features.
        len: usize,
    },

    /// Rasterizing the reference produced no foreground pixel.
    #[error("reference mask is empty")]
    EmptyReferenceMask,

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A candidate raster could not be read or parsed.
///
/// Recovered by the ranking engine: the candidate is skipped and the
/// batch continues.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Reading the raster source failed.
    #[error("failed to read raster: {0}")]
    Io(#[from] std::io::Error),

    /// The raster contains no values.
    #[error("raster is empty")]
    EmptyRaster,

    /// A token could not be parsed as a finite number.
    #[error("malformed raster at line {line}: {reason}")]
    Malformed {
        /// 1-based line number in the source text.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// Rows of a text raster have differing lengths.
    #[error("raster row at line {line} has {found} values, expected {expected}")]
    RaggedRows {
        /// 1-based line number in the source text.
        line: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },

    /// The raster dimensions do not fit in an image buffer.
    #[error("raster dimensions are too large")]
    TooLarge,

    /// Failed to decode an encoded image.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// The embedding service could not produce a vector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbeddingError {
    /// The service is not available at all.
    #[error("embedding service unavailable: {0}")]
    Unavailable(String),

    /// The service failed on a single image.
    #[error("embedding failed: {0}")]
    Failed(String),
}
