//! plotmatch-pipeline: Pure shape-matching core (sans-IO).
//!
//! Matches a reference parcel polygon against candidate raster masks:
//! boundary points -> normalize -> pad -> rasterize -> reference mask,
//! then every candidate is decoded, compared under four flips by IoU and
//! Hausdorff distance, and ranked.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! geometries and byte buffers and returns structured data. All
//! filesystem interaction lives in `plotmatch-io`.

pub mod contour;
pub mod decode;
pub mod embedding;
pub mod geometry;
pub mod mask;
pub mod normalize;
pub mod rank;
pub mod rasterize;
pub mod score;
pub mod types;

pub use decode::{RasterInput, RasterSource, decode_raster};
pub use embedding::{Embedder, EmbeddingRanking, ProfileEmbedder, rank_by_embedding};
pub use mask::{Mask, Transform};
pub use rank::{BestMatch, CancelFlag, Candidate, MatchOutcome, RankedCandidate, Ranking, rank};
pub use score::{ComparisonResult, compare};
pub use types::{
    Contour, DecodeError, EmbeddingError, InputError, MatchConfig, NormalizedPolygon, Point,
};

/// Build the reference mask for a polygon's boundary points.
///
/// # Pipeline steps
///
/// 1. Validate the configuration
/// 2. Min-max normalize into the unit square
/// 3. Pad toward the center by `padding_ratio`
/// 4. Rasterize at `image_size`
///
/// # Errors
///
/// Returns [`InputError::InvalidConfig`] for an unusable configuration,
/// [`InputError::EmptyInput`] or [`InputError::NonFiniteCoordinate`] for
/// bad points, and [`InputError::EmptyReferenceMask`] if the polygon
/// leaves no foreground pixel (fewer than three vertices, or collapsed).
pub fn reference_mask(points: &[Point], config: &MatchConfig) -> Result<Mask, InputError> {
    config.validate()?;

    let normalized = normalize::normalize(points)?;
    let padded = normalize::pad(&normalized, config.padding_ratio);
    let mask = rasterize::rasterize(&padded, config.image_size);

    if !mask.has_foreground() {
        return Err(InputError::EmptyReferenceMask);
    }
    tracing::debug!(
        vertices = points.len(),
        foreground = mask.foreground_count(),
        "reference mask built"
    );
    Ok(mask)
}

/// Build the reference mask straight from a geometry.
///
/// # Errors
///
/// Everything [`geometry::boundary_points`] and [`reference_mask`] return.
pub fn reference_mask_from_geometry(
    geometry: &geo::Geometry<f64>,
    config: &MatchConfig,
) -> Result<Mask, InputError> {
    let points = geometry::boundary_points(geometry)?;
    reference_mask(&points, config)
}
