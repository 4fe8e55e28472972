//! Similarity scoring between a reference mask and one candidate.
//!
//! Two complementary metrics are computed under each of the four
//! [`Transform`]s of the candidate:
//!
//! - **IoU** (region overlap), higher is better;
//! - **symmetric Hausdorff distance** between the largest contours
//!   (boundary agreement), lower is better.
//!
//! Scanned sheets are most often upside down relative to the shapefile,
//! so when the vertical flip scores within a tolerance of the best
//! transform it is reported as the winner. The two metrics pick their
//! winners independently.
//!
//! Every function here is total: degenerate inputs resolve to a defined
//! value (`0.0` IoU, `+∞` distance) instead of an error.

use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::contour::largest_contour;
use crate::mask::{Mask, Transform};
use crate::types::Contour;

/// Best scores for one (reference, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Best IoU over the four transforms, in `[0, 1]`.
    pub iou: f64,
    /// Transform reported for [`iou`](Self::iou); `None` only for the
    /// neutral result.
    pub iou_transform: Option<Transform>,
    /// Best symmetric Hausdorff distance in pixels, `+∞` when no
    /// transform could be measured.
    pub hausdorff: f64,
    /// Transform reported for [`hausdorff`](Self::hausdorff); `None` when
    /// every distance was infinite.
    pub hausdorff_transform: Option<Transform>,
}

impl ComparisonResult {
    /// Worst-case result used when a comparison cannot be made.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            iou: 0.0,
            iou_transform: None,
            hausdorff: f64::INFINITY,
            hausdorff_transform: None,
        }
    }
}

/// Intersection over union of two masks.
///
/// Masks of different shape are incomparable and score `0.0`. Two masks
/// with no foreground at all are vacuously identical and score `1.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn iou(a: &Mask, b: &Mask) -> f64 {
    if a.dimensions() != b.dimensions() {
        return 0.0;
    }

    let (intersection, union) = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .fold((0u64, 0u64), |(inter, uni), (&pa, &pb)| {
            let (fa, fb) = (pa != 0, pb != 0);
            (inter + u64::from(fa && fb), uni + u64::from(fa || fb))
        });

    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// Symmetric Hausdorff distance between two contours.
///
/// The maximum of both directed distances, each the largest
/// nearest-neighbor Euclidean distance from one point set to the other.
/// Returns `+∞` if either contour is empty or the result is not finite.
#[must_use]
pub fn hausdorff(a: &Contour, b: &Contour) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }
    let distance = directed_hausdorff(a, b).max(directed_hausdorff(b, a));
    if distance.is_finite() {
        distance
    } else {
        f64::INFINITY
    }
}

/// Largest distance from a point of `from` to its nearest point of `to`.
///
/// Nearest neighbors come from an R\*-tree over `to`, so the cost is
/// `O(n log m)` rather than the brute-force `O(n m)`.
fn directed_hausdorff(from: &Contour, to: &Contour) -> f64 {
    let tree: RTree<[f64; 2]> = RTree::bulk_load(to.points().iter().map(|p| [p.x, p.y]).collect());

    let mut worst_sq = 0.0f64;
    for p in from.points() {
        let Some(&[nx, ny]) = tree.nearest_neighbor(&[p.x, p.y]) else {
            return f64::INFINITY;
        };
        let (dx, dy) = (p.x - nx, p.y - ny);
        worst_sq = worst_sq.max(dx.mul_add(dx, dy * dy));
    }
    worst_sq.sqrt()
}

/// Score per transform, in [`Transform::ALL`] order.
pub type TransformScores = [(Transform, f64); 4];

/// Pick the reported IoU winner.
///
/// The strict maximum wins (first seen on ties). The vertical flip
/// replaces it when `best - vertical <= tolerance`.
///
/// The gap is a plain `f64` subtraction, so a gap that is only nominally
/// equal to the tolerance can land just above it: `0.9 - 0.89` exceeds
/// `0.01` and keeps the strict winner.
#[must_use]
pub fn select_iou(scores: &TransformScores, tolerance: f64) -> (Transform, f64) {
    let mut best = scores[0];
    for &candidate in &scores[1..] {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }

    if let Some(&vertical) = scores.iter().find(|(t, _)| *t == Transform::FlipVertical)
        && best.1 - vertical.1 <= tolerance
    {
        return vertical;
    }
    best
}

/// Pick the reported Hausdorff winner.
///
/// The strict minimum wins (first seen on ties); if every distance is
/// infinite there is no winner. The vertical flip replaces the winner
/// when both are finite and `vertical <= best + tolerance`.
#[must_use]
pub fn select_hausdorff(scores: &TransformScores, tolerance: f64) -> (Option<Transform>, f64) {
    let mut best: (Option<Transform>, f64) = (None, f64::INFINITY);
    for &(transform, distance) in scores {
        if distance < best.1 {
            best = (Some(transform), distance);
        }
    }

    if let Some(&(_, vertical)) = scores.iter().find(|(t, _)| *t == Transform::FlipVertical)
        && vertical.is_finite()
        && best.1.is_finite()
        && vertical <= best.1 + tolerance
    {
        return (Some(Transform::FlipVertical), vertical);
    }
    best
}

/// Compare a candidate against the reference under all four transforms.
///
/// The reference contour is traced once; each transformed candidate is
/// scored for IoU and Hausdorff distance, and the winners are chosen by
/// [`select_iou`] and [`select_hausdorff`].
#[must_use]
pub fn compare(
    reference: &Mask,
    candidate: &Mask,
    iou_tolerance: f64,
    hausdorff_tolerance: f64,
) -> ComparisonResult {
    let reference_contour = largest_contour(reference);

    let mut iou_scores: TransformScores = Transform::ALL.map(|t| (t, 0.0));
    let mut distance_scores: TransformScores = Transform::ALL.map(|t| (t, f64::INFINITY));

    for (slot, transform) in Transform::ALL.into_iter().enumerate() {
        let variant = candidate.transformed(transform);
        iou_scores[slot].1 = iou(reference, &variant);
        distance_scores[slot].1 = hausdorff(&reference_contour, &largest_contour(&variant));
    }

    let (iou_transform, best_iou) = select_iou(&iou_scores, iou_tolerance);
    let (hausdorff_transform, best_hausdorff) =
        select_hausdorff(&distance_scores, hausdorff_tolerance);

    ComparisonResult {
        iou: best_iou,
        iou_transform: Some(iou_transform),
        hausdorff: best_hausdorff,
        hausdorff_transform,
    }
}

/// Like [`compare`], but yields [`ComparisonResult::neutral`] when either
/// mask is missing so one unusable candidate cannot abort a batch.
#[must_use]
pub fn compare_optional(
    reference: Option<&Mask>,
    candidate: Option<&Mask>,
    iou_tolerance: f64,
    hausdorff_tolerance: f64,
) -> ComparisonResult {
    match (reference, candidate) {
        (Some(reference), Some(candidate)) => {
            compare(reference, candidate, iou_tolerance, hausdorff_tolerance)
        }
        _ => ComparisonResult::neutral(),
    }
}
