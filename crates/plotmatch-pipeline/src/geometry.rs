//! Boundary extraction from reference geometries.
//!
//! Turns one `geo` geometry into the ordered point sequence the
//! normalizer consumes. Areal kinds contribute their exterior ring,
//! linear kinds their vertices, and a point itself. Multi-part kinds
//! and collections have no single boundary and are rejected.

use geo::{Coord, Geometry};

use crate::types::{InputError, Point};

/// Extract the boundary points of a geometry.
///
/// Interior rings of polygons are ignored.
///
/// # Errors
///
/// Returns [`InputError::UnsupportedGeometry`] for multi-part kinds and
/// collections, and [`InputError::EmptyInput`] when the geometry has no
/// coordinates.
pub fn boundary_points(geometry: &Geometry<f64>) -> Result<Vec<Point>, InputError> {
    let coords: Vec<Coord<f64>> = match geometry {
        Geometry::Point(p) => vec![p.0],
        Geometry::Line(line) => vec![line.start, line.end],
        Geometry::LineString(ls) => ls.0.clone(),
        Geometry::Polygon(poly) => poly.exterior().0.clone(),
        Geometry::Rect(rect) => rect.to_polygon().exterior().0.clone(),
        Geometry::Triangle(tri) => tri.to_polygon().exterior().0.clone(),
        Geometry::MultiPoint(_) => return Err(unsupported("MultiPoint")),
        Geometry::MultiLineString(_) => return Err(unsupported("MultiLineString")),
        Geometry::MultiPolygon(_) => return Err(unsupported("MultiPolygon")),
        Geometry::GeometryCollection(_) => return Err(unsupported("GeometryCollection")),
    };

    if coords.is_empty() {
        return Err(InputError::EmptyInput);
    }
    Ok(coords.into_iter().map(|c| Point::new(c.x, c.y)).collect())
}

const fn unsupported(kind: &'static str) -> InputError {
    InputError::UnsupportedGeometry { kind }
}

/// Pick the feature the user asked for.
///
/// # Errors
///
/// Returns [`InputError::IndexOutOfRange`] if `index` is past the end.
pub fn select_feature<T>(features: &[T], index: usize) -> Result<&T, InputError> {
    features.get(index).ok_or(InputError::IndexOutOfRange {
        index,
        len: features.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use geo::{Line, LineString, MultiPolygon, Polygon, Rect, Triangle, coord, point, polygon};

    use super::*;

    fn xy(points: &[Point]) -> Vec<(f64, f64)> {
        points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn polygon_yields_closed_exterior_ring() {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 3.0)];
        let points = boundary_points(&Geometry::Polygon(poly)).unwrap();
        assert_eq!(
            xy(&points),
            [(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 0.0)]
        );
    }

    #[test]
    fn polygon_holes_are_ignored() {
        let poly = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            vec![LineString::from(vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0)])],
        );
        let points = boundary_points(&Geometry::Polygon(poly)).unwrap();
        assert_eq!(points.len(), 5);
        assert!(points.iter().all(|p| p.x == 0.0 || p.x == 10.0));
    }

    #[test]
    fn line_string_yields_vertices() {
        let ls = LineString::from(vec![(1.0, 2.0), (3.0, 4.0), (5.0, 0.0)]);
        let points = boundary_points(&Geometry::LineString(ls)).unwrap();
        assert_eq!(xy(&points), [(1.0, 2.0), (3.0, 4.0), (5.0, 0.0)]);
    }

    #[test]
    fn line_yields_endpoints() {
        let line = Line::new(coord! { x: 0.0, y: 1.0 }, coord! { x: 2.0, y: 3.0 });
        let points = boundary_points(&Geometry::Line(line)).unwrap();
        assert_eq!(xy(&points), [(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn point_yields_itself() {
        let points = boundary_points(&Geometry::Point(point!(x: 5.0, y: 5.0))).unwrap();
        assert_eq!(xy(&points), [(5.0, 5.0)]);
    }

    #[test]
    fn rect_and_triangle_are_areal() {
        let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 1.0 });
        assert_eq!(boundary_points(&Geometry::Rect(rect)).unwrap().len(), 5);

        let tri = Triangle::new(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 0.0 },
            coord! { x: 0.0, y: 1.0 },
        );
        assert_eq!(boundary_points(&Geometry::Triangle(tri)).unwrap().len(), 4);
    }

    #[test]
    fn multi_polygon_is_unsupported() {
        let result = boundary_points(&Geometry::MultiPolygon(MultiPolygon::new(vec![])));
        assert!(matches!(
            result,
            Err(InputError::UnsupportedGeometry {
                kind: "MultiPolygon"
            })
        ));
    }

    #[test]
    fn empty_line_string_is_empty_input() {
        let result = boundary_points(&Geometry::LineString(LineString::new(vec![])));
        assert!(matches!(result, Err(InputError::EmptyInput)));
    }

    #[test]
    fn select_feature_in_and_out_of_range() {
        let features = ["a", "b"];
        assert_eq!(*select_feature(&features, 1).unwrap(), "b");
        assert!(matches!(
            select_feature(&features, 2),
            Err(InputError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }
}
