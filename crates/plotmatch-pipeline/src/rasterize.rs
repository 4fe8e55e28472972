//! Fill a normalized polygon into a square binary mask.
//!
//! Coordinates are scaled by `image_size - 1` and rounded to the nearest
//! grid cell, so `(0, 0)` lands on the top-left pixel and `(1, 1)` on the
//! bottom-right one. The interior is filled with an even-odd scanline
//! rule sampled at pixel centers, then the outline is drawn with
//! `imageproc` so boundary pixels are always foreground.

use image::Luma;
use imageproc::drawing::draw_line_segment_mut;

use crate::mask::Mask;
use crate::types::{GrayImage, NormalizedPolygon};

/// A polygon needs at least this many vertices to enclose area.
pub const MIN_VERTICES: usize = 3;

/// Foreground value written into the canvas.
const FILL: Luma<u8> = Luma([1]);

/// Rasterize a normalized polygon into an `image_size × image_size` mask.
///
/// Returns an all-zero mask when the polygon has fewer than
/// [`MIN_VERTICES`] points, or when rounding onto the grid leaves fewer
/// than [`MIN_VERTICES`] distinct vertices (the shape collapsed to a line
/// or a point). Never fails.
#[must_use]
pub fn rasterize(polygon: &NormalizedPolygon, image_size: u32) -> Mask {
    let mut canvas = GrayImage::new(image_size, image_size);
    if polygon.len() < MIN_VERTICES || image_size == 0 {
        return Mask::from_binary(canvas);
    }

    let scale = f64::from(image_size - 1);
    let vertices: Vec<(i32, i32)> = polygon
        .points()
        .iter()
        .map(|p| (to_grid(p.x, scale), to_grid(p.y, scale)))
        .collect();

    let ring = distinct_ring(vertices);
    if ring.len() < MIN_VERTICES {
        tracing::debug!(
            vertices = polygon.len(),
            distinct = ring.len(),
            "polygon collapsed on the grid; returning empty mask"
        );
        return Mask::from_binary(canvas);
    }

    fill_even_odd(&mut canvas, &ring);
    draw_outline(&mut canvas, &ring);
    Mask::from_binary(canvas)
}

/// Scale a unit coordinate onto the grid and round to the nearest cell.
#[allow(clippy::cast_possible_truncation)]
fn to_grid(v: f64, scale: f64) -> i32 {
    (v * scale).round() as i32
}

/// Drop consecutive duplicate vertices, including the closing vertex
/// that repeats the first one.
fn distinct_ring(mut vertices: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

/// Iterate the closed ring's edges, including last → first.
fn edges(ring: &[(i32, i32)]) -> impl Iterator<Item = ((i32, i32), (i32, i32))> + '_ {
    ring.iter()
        .copied()
        .zip(ring.iter().copied().cycle().skip(1))
}

/// Even-odd scanline fill sampled at integer pixel centers.
///
/// Each edge covers the half-open row range `[min_y, max_y)`, so every
/// row crosses a closed ring an even number of times.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn fill_even_odd(canvas: &mut GrayImage, ring: &[(i32, i32)]) {
    let (width, height) = canvas.dimensions();
    let max_x = f64::from(width) - 1.0;
    let mut crossings: Vec<f64> = Vec::new();

    for y in 0..height {
        let yc = f64::from(y);
        crossings.clear();
        for ((ax, ay), (bx, by)) in edges(ring) {
            let (ay, by) = (f64::from(ay), f64::from(by));
            let spans_row = (ay <= yc && yc < by) || (by <= yc && yc < ay);
            if spans_row {
                let (ax, bx) = (f64::from(ax), f64::from(bx));
                crossings.push((yc - ay).mul_add((bx - ax) / (by - ay), ax));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let from = span[0].ceil().max(0.0);
            let to = span[1].floor().min(max_x);
            if from > to {
                continue;
            }
            for x in (from as u32)..=(to as u32) {
                canvas.put_pixel(x, y, FILL);
            }
        }
    }
}

/// Draw every edge of the ring so boundary pixels are foreground.
#[allow(clippy::cast_precision_loss)]
fn draw_outline(canvas: &mut GrayImage, ring: &[(i32, i32)]) {
    for ((ax, ay), (bx, by)) in edges(ring) {
        draw_line_segment_mut(
            canvas,
            (ax as f32, ay as f32),
            (bx as f32, by as f32),
            FILL,
        );
    }
}
