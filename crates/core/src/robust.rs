//! Robust orientation predicates.
//!
//! Thin wrappers over Shewchuk's adaptive-precision `orient2d` (via the
//! `robust` crate), used where a wrong sign would corrupt a decomposition:
//! ear clipping, convexity checks and signed area.

use crate::geometry::Point;
use robust::{orient2d as robust_orient2d, Coord};

/// Result of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Left turn.
    CounterClockwise,
    /// Right turn.
    Clockwise,
    /// The three points are collinear.
    Collinear,
}

impl Orientation {
    /// Returns true for a left turn.
    #[inline]
    pub fn is_ccw(self) -> bool {
        matches!(self, Orientation::CounterClockwise)
    }

    /// Returns true for a right turn.
    #[inline]
    pub fn is_cw(self) -> bool {
        matches!(self, Orientation::Clockwise)
    }

    /// Returns true for collinear points.
    #[inline]
    pub fn is_collinear(self) -> bool {
        matches!(self, Orientation::Collinear)
    }
}

#[inline]
fn coord(p: Point) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

/// Orientation of `pc` relative to the directed line `pa -> pb`.
#[inline]
pub fn orient2d(pa: Point, pb: Point, pc: Point) -> Orientation {
    let det = robust_orient2d(coord(pa), coord(pb), coord(pc));
    if det > 0.0 {
        Orientation::CounterClockwise
    } else if det < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Returns true if `p` lies strictly inside triangle `abc` (any winding).
pub fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let o1 = orient2d(a, b, p);
    let o2 = orient2d(b, c, p);
    let o3 = orient2d(c, a, p);

    (o1.is_ccw() && o2.is_ccw() && o3.is_ccw()) || (o1.is_cw() && o2.is_cw() && o3.is_cw())
}

/// Returns true if the polygon turns the same way at every non-collinear vertex.
pub fn is_convex(polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut expected: Option<Orientation> = None;
    for i in 0..n {
        let o = orient2d(polygon[i], polygon[(i + 1) % n], polygon[(i + 2) % n]);
        if o.is_collinear() {
            continue;
        }
        match expected {
            None => expected = Some(o),
            Some(e) if e != o => return false,
            _ => {}
        }
    }

    true
}

/// Signed area by the shoelace formula with Kahan summation.
///
/// Positive for counter-clockwise loops in a y-up frame.
pub fn signed_area(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut compensation = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let term = a.x * b.y - b.x * a.y - compensation;
        let t = sum + term;
        compensation = (t - sum) - term;
        sum = t;
    }

    sum / 2.0
}
