//! Contour extraction: the boundary of a mask's largest foreground region.
//!
//! Only used for boundary-distance scoring. Tracing is delegated to
//! Suzuki-Abe border following via `imageproc::contours::find_contours`;
//! only outermost borders are considered (holes and anything nested
//! inside a hole are ignored), and the one enclosing the largest
//! shoelace area wins.
//!
//! The mask is traced inside a one-pixel empty frame. Border following
//! classifies a region touching the left image edge as a parentless
//! hole, so without the frame such regions would be dropped.

use geo::{Area, LineString, Polygon};
use image::imageops;
use imageproc::contours::{BorderType, find_contours};

use crate::mask::Mask;
use crate::types::{Contour, GrayImage, Point};

/// Extract the boundary of the largest external region of `mask`.
///
/// Returns an empty contour when the mask has no foreground.
///
/// When two regions enclose exactly the same area the first one found
/// wins. Border following scans rows top to bottom, left to right, so
/// this is the region whose topmost-leftmost pixel comes first.
#[must_use]
pub fn largest_contour(mask: &Mask) -> Contour {
    if !mask.has_foreground() {
        return Contour::default();
    }

    let contours: Vec<imageproc::contours::Contour<i32>> = find_contours(&framed(mask));

    let mut best: Option<(f64, Vec<Point>)> = None;
    for contour in contours {
        if contour.border_type != BorderType::Outer || contour.parent.is_some() {
            continue;
        }
        let points: Vec<Point> = contour
            .points
            .into_iter()
            .map(|p| Point::new(f64::from(p.x - 1), f64::from(p.y - 1)))
            .collect();
        let area = enclosed_area(&points);
        if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
            best = Some((area, points));
        }
    }

    best.map_or_else(Contour::default, |(_, points)| Contour::new(points))
}

/// Copy of the mask with one empty pixel added on every side.
fn framed(mask: &Mask) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut canvas = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut canvas, mask.as_gray(), 1, 1);
    canvas
}

/// Shoelace area of the closed ring through `points`.
fn enclosed_area(points: &[Point]) -> f64 {
    let ring: LineString<f64> = points.iter().map(|p| (p.x, p.y)).collect();
    Polygon::new(ring, vec![]).unsigned_area()
}
