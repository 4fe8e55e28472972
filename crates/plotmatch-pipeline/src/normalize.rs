//! Raw polygon coordinates to padded unit-square coordinates.
//!
//! Two steps:
//!
//! ```text
//! norm   = (p - min) / (max - min)         per axis, 0.5 when max == min
//! padded = 0.5 + (norm - 0.5) × max(0, 1 - 2 × padding_ratio)
//! ```
//!
//! Each axis is normalized independently, so the shape is stretched to
//! fill the unit square. Padding then shrinks it toward the center so
//! the rasterized shape does not touch the raster edge.

use crate::types::{InputError, NormalizedPolygon, Point};

/// Normalize raw boundary coordinates into `[0, 1]²`.
///
/// A zero-range axis (all points share the same x or the same y) maps
/// to the constant `0.5` instead of dividing by zero. A single point
/// normalizes to exactly `(0.5, 0.5)`.
///
/// # Errors
///
/// Returns [`InputError::EmptyInput`] if `points` is empty and
/// [`InputError::NonFiniteCoordinate`] if any coordinate is NaN or
/// infinite.
pub fn normalize(points: &[Point]) -> Result<NormalizedPolygon, InputError> {
    let Some(first) = points.first() else {
        return Err(InputError::EmptyInput);
    };
    if let Some(bad) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(InputError::NonFiniteCoordinate { x: bad.x, y: bad.y });
    }

    let (min, max) = points.iter().fold((*first, *first), |(lo, hi), p| {
        (
            Point::new(lo.x.min(p.x), lo.y.min(p.y)),
            Point::new(hi.x.max(p.x), hi.y.max(p.y)),
        )
    });

    let axis = |v: f64, lo: f64, hi: f64| {
        let range = hi - lo;
        if range > 0.0 {
            ((v - lo) / range).clamp(0.0, 1.0)
        } else {
            0.5
        }
    };

    let normalized = points
        .iter()
        .map(|p| Point::new(axis(p.x, min.x, max.x), axis(p.y, min.y, max.y)))
        .collect();
    Ok(NormalizedPolygon::from_unchecked(normalized))
}

/// Shrink a normalized polygon toward `(0.5, 0.5)`.
///
/// The scale factor is `max(0, 1 - 2 × padding_ratio)`, so
/// `padding_ratio = 0` is the identity and `padding_ratio >= 0.5`
/// collapses every point onto the center. Results are clamped back into
/// `[0, 1]`.
///
/// Emptiness is already ruled out by the [`NormalizedPolygon`]
/// constructors, so this step cannot fail.
#[must_use]
pub fn pad(normalized: &NormalizedPolygon, padding_ratio: f64) -> NormalizedPolygon {
    let scale = 2.0f64.mul_add(-padding_ratio, 1.0).max(0.0);
    let shrink = |v: f64| (v - 0.5).mul_add(scale, 0.5).clamp(0.0, 1.0);

    let padded = normalized
        .points()
        .iter()
        .map(|p| Point::new(shrink(p.x), shrink(p.y)))
        .collect();
    NormalizedPolygon::from_unchecked(padded)
}
