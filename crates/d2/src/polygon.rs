//! Plain polygon operations on point loops.
//!
//! A loop is an ordered `[Point]` without a repeated closing vertex. Signed
//! areas are positive for counter-clockwise loops; the engine stores every
//! normalized loop with non-positive area.

use geo::{ConvexHull, Coord, LineString};
use polynest_core::robust::{is_convex, signed_area};
use polynest_core::{almost_equal, Bounds, Point};

/// Coordinate comparison tolerance.
pub const TOL: f64 = 1e-9;

/// Where a point lies relative to a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    /// Strictly inside.
    Inside,
    /// Strictly outside.
    Outside,
    /// On a vertex or an edge.
    Boundary,
}

/// Signed area of a loop.
#[inline]
pub fn area(points: &[Point]) -> f64 {
    signed_area(points)
}

/// Bounding box of a loop, `None` when empty.
#[inline]
pub fn bounds(points: &[Point]) -> Option<Bounds> {
    Bounds::from_points(points)
}

/// Rotates every vertex about the origin by `degrees`.
pub fn rotate(points: &[Point], degrees: f64) -> Vec<Point> {
    if degrees == 0.0 {
        return points.to_vec();
    }
    points.iter().map(|p| p.rotated(degrees)).collect()
}

/// Shifts every vertex by `(dx, dy)`.
pub fn translate(points: &[Point], dx: f64, dy: f64) -> Vec<Point> {
    points.iter().map(|p| p.translated(dx, dy)).collect()
}

/// Reverses the loop when its signed area is positive.
///
/// Applying it twice yields the same loop as applying it once.
pub fn normalize_orientation(points: &[Point]) -> Vec<Point> {
    if area(points) > 0.0 {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    }
}

/// Returns the loop with the requested orientation sign.
pub fn with_orientation(points: Vec<Point>, positive: bool) -> Vec<Point> {
    let a = area(&points);
    if (positive && a < 0.0) || (!positive && a > 0.0) {
        points.into_iter().rev().collect()
    } else {
        points
    }
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    if almost_equal(a.x, b.x, TOL) && almost_equal(a.y, b.y, TOL) {
        return almost_equal(a.x, p.x, TOL) && almost_equal(a.y, p.y, TOL);
    }
    let cross = (p.y - a.y) * (b.x - a.x) - (p.x - a.x) * (b.y - a.y);
    if cross.abs() > TOL * a.distance(b).max(1.0) {
        return false;
    }
    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    let len2 = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
    dot >= -TOL && dot <= len2 + TOL
}

/// Ray-casting point-in-polygon test that reports boundary hits separately.
pub fn locate_point(point: Point, polygon: &[Point]) -> PointLocation {
    let n = polygon.len();
    if n < 3 {
        return PointLocation::Outside;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];

        if on_segment(pi, pj, point) {
            return PointLocation::Boundary;
        }

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    if inside {
        PointLocation::Inside
    } else {
        PointLocation::Outside
    }
}

/// Returns true if `inner` lies inside `outer`, judged by its first vertex
/// that is not on `outer`'s boundary.
pub fn loop_inside(inner: &[Point], outer: &[Point]) -> bool {
    for &p in inner {
        match locate_point(p, outer) {
            PointLocation::Inside => return true,
            PointLocation::Outside => return false,
            PointLocation::Boundary => continue,
        }
    }
    false
}

/// Returns true if the loop is an axis-aligned rectangle.
pub fn is_rectangle(points: &[Point], tolerance: f64) -> bool {
    let Some(b) = bounds(points) else {
        return false;
    };
    if points.len() != 4 {
        return false;
    }
    points.iter().all(|p| {
        (almost_equal(p.x, b.x, tolerance) || almost_equal(p.x, b.max_x(), tolerance))
            && (almost_equal(p.y, b.y, tolerance) || almost_equal(p.y, b.max_y(), tolerance))
    })
}

/// Returns true if every turn of the loop goes the same way.
#[inline]
pub fn is_convex_loop(points: &[Point]) -> bool {
    is_convex(points)
}

/// Convex hull of a point set, counter-clockwise, without the closing vertex.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let coords: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    let hull = LineString::from(coords).convex_hull();
    let exterior = hull.exterior();
    let count = exterior.coords().count().saturating_sub(1);

    exterior
        .coords()
        .take(count)
        .map(|c| Point::new(c.x, c.y))
        .collect()
}

/// Converts an overlay contour back to a loop.
pub fn from_contour(contour: &[[f64; 2]]) -> Vec<Point> {
    contour.iter().map(|&[x, y]| Point::new(x, y)).collect()
}
