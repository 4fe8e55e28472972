//! Property-based tests for the scoring core.
//!
//! # Invariants tested
//!
//! - **IoU range and symmetry:** `iou(a, b)` lies in `[0, 1]` and equals
//!   `iou(b, a)`; `iou(a, a)` is `1.0`.
//! - **Hausdorff symmetry:** the distance is the same in both directions
//!   and never negative.
//! - **Edge regions:** a region touching any image edge still has a
//!   contour; its self-distance is `0` and its scores stay finite.
//! - **Flip recovery:** a candidate that is any flip of the reference is
//!   matched within the prioritization tolerances of a perfect score.
//! - **Normalization range:** normalized and padded points stay in the
//!   unit square.
//! - **Degenerate rasterization:** fewer than three points never paints.

#![allow(clippy::unwrap_used)]

use plotmatch_pipeline::contour::largest_contour;
use plotmatch_pipeline::normalize::{normalize, pad};
use plotmatch_pipeline::rasterize::rasterize;
use plotmatch_pipeline::score::{compare, hausdorff, iou};
use plotmatch_pipeline::types::GrayImage;
use plotmatch_pipeline::{Mask, Point, Transform};
use proptest::prelude::*;

const SIDE: u32 = 12;

/// Random binary mask of side [`SIDE`].
fn mask_strategy() -> impl Strategy<Value = Mask> {
    prop::collection::vec(any::<bool>(), (SIDE * SIDE) as usize).prop_map(|bits| {
        let raw = bits.into_iter().map(u8::from).collect();
        Mask::from_gray(GrayImage::from_raw(SIDE, SIDE, raw).unwrap())
    })
}

/// Random mask built from one filled rectangle, so it has a single
/// dominant region.
fn blob_strategy() -> impl Strategy<Value = Mask> {
    (0..SIDE / 2, 0..SIDE / 2, 1..SIDE / 2, 1..SIDE / 2).prop_map(|(x0, y0, w, h)| {
        let raw = (0..SIDE * SIDE)
            .map(|i| {
                let (x, y) = (i % SIDE, i / SIDE);
                u8::from((x0..x0 + w).contains(&x) && (y0..y0 + h).contains(&y))
            })
            .collect();
        Mask::from_gray(GrayImage::from_raw(SIDE, SIDE, raw).unwrap())
    })
}

/// Random rectangle flush against one of the four image edges
/// (0 left, 1 top, 2 right, 3 bottom).
fn edge_blob_strategy() -> impl Strategy<Value = Mask> {
    (0u32..4, 0..SIDE / 2, 1..SIDE / 2, 1..SIDE / 2).prop_map(|(edge, offset, w, h)| {
        let (x0, y0) = match edge {
            0 => (0, offset),
            1 => (offset, 0),
            2 => (SIDE - w, offset),
            _ => (offset, SIDE - h),
        };
        let raw = (0..SIDE * SIDE)
            .map(|i| {
                let (x, y) = (i % SIDE, i / SIDE);
                u8::from((x0..x0 + w).contains(&x) && (y0..y0 + h).contains(&y))
            })
            .collect();
        Mask::from_gray(GrayImage::from_raw(SIDE, SIDE, raw).unwrap())
    })
}

fn points_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((-1e6..1e6f64, -1e6..1e6f64), min..max)
        .prop_map(|coords| coords.into_iter().map(Point::from).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn iou_is_bounded_and_symmetric(a in mask_strategy(), b in mask_strategy()) {
        let ab = iou(&a, &b);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((ab - iou(&b, &a)).abs() < 1e-12);
    }

    #[test]
    fn iou_is_reflexive(a in mask_strategy()) {
        prop_assert!((iou(&a, &a) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hausdorff_is_symmetric(a in blob_strategy(), b in blob_strategy()) {
        let (ca, cb) = (largest_contour(&a), largest_contour(&b));
        let ab = hausdorff(&ca, &cb);
        let ba = hausdorff(&cb, &ca);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn regions_touching_an_edge_keep_finite_distances(a in edge_blob_strategy()) {
        let contour = largest_contour(&a);
        prop_assert!(!contour.is_empty());
        prop_assert!(hausdorff(&contour, &contour).abs() < f64::EPSILON);

        let result = compare(&a, &a, 0.01, 2.0);
        prop_assert!(result.hausdorff.is_finite());
        prop_assert!(result.hausdorff_transform.is_some());
    }

    #[test]
    fn any_flip_of_reference_is_recovered(
        a in blob_strategy(),
        which in 0usize..4,
    ) {
        let candidate = a.transformed(Transform::ALL[which]);
        let result = compare(&a, &candidate, 0.01, 2.0);
        // The vertical flip may be promoted, but only within tolerance of
        // the perfect score.
        prop_assert!(result.iou >= 0.99);
        prop_assert!(result.hausdorff <= 2.0);
    }

    #[test]
    fn normalized_and_padded_points_stay_in_unit_square(
        points in points_strategy(1, 40),
        ratio in 0.0..1.0f64,
    ) {
        let padded = pad(&normalize(&points).unwrap(), ratio);
        prop_assert_eq!(padded.len(), points.len());
        for p in padded.points() {
            prop_assert!((0.0..=1.0).contains(&p.x));
            prop_assert!((0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn fewer_than_three_points_never_paint(
        points in points_strategy(1, 3),
        size in 1u32..64,
    ) {
        let mask = rasterize(&normalize(&points).unwrap(), size);
        prop_assert_eq!(mask.dimensions(), (size, size));
        prop_assert!(!mask.has_foreground());
    }
}
