//! Polygon clipping adapter.
//!
//! Boolean operations go through `i_overlay`, offsetting through `geo`'s
//! round-join buffer. Inputs are snapped to a `1 / clipper_scale` grid first
//! so results do not depend on float noise below that resolution.

use crate::polygon::{self, from_contour};
use geo::{Buffer, Coord, LineString, Polygon as GeoPolygon};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use polynest_core::{Config, Point};

/// An outer loop and the holes cut out of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    /// Outer boundary.
    pub outer: Vec<Point>,
    /// Holes inside `outer`.
    pub holes: Vec<Vec<Point>>,
}

impl Shape {
    /// Loops whose non-zero fill is this shape: outer positive, holes negative.
    pub fn into_oriented_loops(self) -> impl Iterator<Item = Vec<Point>> {
        std::iter::once(polygon::with_orientation(self.outer, true))
            .chain(self.holes.into_iter().map(|h| polygon::with_orientation(h, false)))
    }
}

/// Clipping primitives configured from a [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct Clipper {
    scale: f64,
    tolerance: f64,
}

impl Clipper {
    /// Creates an adapter using `config.clipper_scale` and `config.curve_tolerance`.
    pub fn new(config: &Config) -> Self {
        Self {
            scale: config.clipper_scale.max(1.0),
            tolerance: config.curve_tolerance,
        }
    }

    /// Curve tolerance this adapter cleans with.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[inline]
    fn snap(&self, p: Point) -> Point {
        Point::new(
            (p.x * self.scale).round() / self.scale,
            (p.y * self.scale).round() / self.scale,
        )
    }

    fn contours(&self, loops: &[Vec<Point>]) -> Vec<Vec<[f64; 2]>> {
        loops
            .iter()
            .filter(|l| l.len() >= 3)
            .map(|l| l.iter().map(|&p| self.snap(p)).map(|p| [p.x, p.y]).collect())
            .collect()
    }

    fn flatten(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<Vec<Point>> {
        shapes
            .into_iter()
            .flatten()
            .filter(|contour| contour.len() >= 3)
            .map(|contour| from_contour(&contour))
            .collect()
    }

    // The overlay engine emits each shape as its outer contour followed by holes.
    fn structured(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<Shape> {
        shapes
            .into_iter()
            .filter_map(|shape| {
                let mut contours = shape.into_iter().filter(|c| c.len() >= 3);
                let outer = from_contour(&contours.next()?);
                Some(Shape {
                    outer,
                    holes: contours.map(|c| from_contour(&c)).collect(),
                })
            })
            .collect()
    }

    fn overlay(&self, subject: &[Vec<Point>], clip: &[Vec<Point>]) -> Vec<Vec<Vec<[f64; 2]>>> {
        let subject = self.contours(subject);
        if subject.is_empty() {
            return Vec::new();
        }
        let clip = self.contours(clip);
        let rule = if clip.is_empty() {
            OverlayRule::Subject
        } else {
            OverlayRule::Difference
        };
        subject.overlay(&clip, rule, FillRule::NonZero)
    }

    /// Inflates (positive distance) or deflates (negative distance) a loop.
    ///
    /// Returns the outer boundaries of the resulting polygons; an empty list
    /// means the loop vanished.
    pub fn offset(&self, points: &[Point], distance: f64) -> Vec<Vec<Point>> {
        if points.len() < 3 {
            return Vec::new();
        }
        if distance == 0.0 {
            return vec![points.to_vec()];
        }

        let ccw = polygon::with_orientation(points.iter().map(|&p| self.snap(p)).collect(), true);
        let coords: Vec<Coord<f64>> = ccw.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
        let shape = GeoPolygon::new(LineString::from(coords), Vec::new());

        shape
            .buffer(distance)
            .0
            .iter()
            .map(|poly| {
                let ring = poly.exterior();
                let count = ring.coords().count().saturating_sub(1);
                ring.coords()
                    .take(count)
                    .map(|c| Point::new(c.x, c.y))
                    .collect::<Vec<_>>()
            })
            .filter(|ring| ring.len() >= 3)
            .collect()
    }

    /// Non-zero union of all loops.
    pub fn union(&self, loops: &[Vec<Point>]) -> Vec<Vec<Point>> {
        Self::flatten(self.overlay(loops, &[]))
    }

    /// Non-zero union of all loops, keeping which loops are holes.
    pub fn union_shapes(&self, loops: &[Vec<Point>]) -> Vec<Shape> {
        Self::structured(self.overlay(loops, &[]))
    }

    /// Non-zero difference `subject - clip`.
    pub fn difference(&self, subject: &[Vec<Point>], clip: &[Vec<Point>]) -> Vec<Vec<Point>> {
        Self::flatten(self.overlay(subject, clip))
    }

    /// Non-zero difference `subject - clip`, keeping which loops are holes.
    pub fn difference_shapes(&self, subject: &[Vec<Point>], clip: &[Vec<Point>]) -> Vec<Shape> {
        Self::structured(self.overlay(subject, clip))
    }

    /// Resolves self-intersections, keeps the largest loop and cleans it.
    ///
    /// Returns `None` when nothing with at least three vertices survives.
    pub fn simplify_and_clean(&self, points: &[Point]) -> Option<Vec<Point>> {
        if points.len() < 3 {
            return None;
        }

        let largest = self
            .union(&[points.to_vec()])
            .into_iter()
            .max_by(|a, b| polygon::area(a).abs().total_cmp(&polygon::area(b).abs()))?;

        let cleaned = self.clean(&largest);
        (cleaned.len() >= 3).then_some(cleaned)
    }

    /// Drops vertices within tolerance of a neighbour or of the segment
    /// joining their neighbours.
    pub fn clean(&self, points: &[Point]) -> Vec<Point> {
        let tol = self.tolerance;
        let mut result: Vec<Point> = points.to_vec();

        loop {
            let n = result.len();
            if n < 3 {
                return Vec::new();
            }

            let removable = (0..n).find(|&i| {
                let prev = result[(i + n - 1) % n];
                let curr = result[i];
                let next = result[(i + 1) % n];
                curr.distance(prev) < tol || segment_distance(curr, prev, next) < tol
            });

            match removable {
                Some(i) => {
                    result.remove(i);
                }
                None => return result,
            }
        }
    }
}

/// Distance from `p` to the segment `a-b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::{area, bounds};
    use approx::assert_relative_eq;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    fn clipper() -> Clipper {
        Clipper::new(&Config::default())
    }

    #[test]
    fn test_clean_removes_close_and_collinear() {
        let noisy = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.05, 10.0),
            Point::new(0.0, 10.0),
        ];
        let cleaned = clipper().clean(&noisy);
        assert_eq!(cleaned.len(), 4);
        assert_relative_eq!(area(&cleaned).abs(), 100.0, epsilon = 1.0);
    }

    #[test]
    fn test_clean_collapses_degenerate() {
        let sliver = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 0.01),
        ];
        assert!(clipper().clean(&sliver).is_empty());
    }

    #[test]
    fn test_simplify_keeps_largest_loop() {
        let messy = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let simplified = clipper().simplify_and_clean(&messy).unwrap();
        assert_eq!(simplified.len(), 4);
        assert_relative_eq!(area(&simplified).abs(), 100.0, epsilon = 1e-6);

        assert!(clipper().simplify_and_clean(&messy[..2]).is_none());
    }

    #[test]
    fn test_offset_square() {
        let grown = clipper().offset(&square(0.0, 0.0, 10.0), 1.0);
        assert_eq!(grown.len(), 1);
        let b = bounds(&grown[0]).unwrap();
        assert_relative_eq!(b.width, 12.0, epsilon = 1e-6);

        let shrunk = clipper().offset(&square(0.0, 0.0, 10.0), -1.0);
        assert_eq!(shrunk.len(), 1);
        assert_relative_eq!(area(&shrunk[0]).abs(), 64.0, epsilon = 1e-6);

        assert!(clipper().offset(&square(0.0, 0.0, 1.0), -1.0).is_empty());
    }

    #[test]
    fn test_union_and_difference() {
        let merged = clipper().union(&[square(0.0, 0.0, 10.0), square(5.0, 0.0, 10.0)]);
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(area(&merged[0]).abs(), 150.0, epsilon = 1e-6);

        let cut = clipper().difference(&[square(0.0, 0.0, 10.0)], &[square(5.0, -1.0, 10.0)]);
        assert_eq!(cut.len(), 1);
        assert_relative_eq!(area(&cut[0]).abs(), 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_shapes_keep_holes_apart() {
        let ring = clipper().difference_shapes(&[square(0.0, 0.0, 10.0)], &[square(3.0, 3.0, 4.0)]);
        assert_eq!(ring.len(), 1);
        assert_relative_eq!(area(&ring[0].outer).abs(), 100.0, epsilon = 1e-6);
        assert_eq!(ring[0].holes.len(), 1);
        assert_relative_eq!(area(&ring[0].holes[0]).abs(), 16.0, epsilon = 1e-6);

        let loops: Vec<Vec<Point>> = ring[0].clone().into_oriented_loops().collect();
        assert!(area(&loops[0]) > 0.0);
        assert!(area(&loops[1]) < 0.0);

        let apart = clipper().union_shapes(&[square(0.0, 0.0, 2.0), square(5.0, 0.0, 2.0)]);
        assert_eq!(apart.len(), 2);
        assert!(apart.iter().all(|s| s.holes.is_empty()));
    }

    #[test]
    fn test_union_cancels_opposite_interior_loop() {
        let outer = polygon::with_orientation(square(0.0, 0.0, 10.0), false);
        let hole = polygon::with_orientation(square(2.0, 2.0, 4.0), true);
        let loops = clipper().union(&[outer, hole]);
        let total: f64 = loops.iter().map(|l| area(l)).sum();
        assert_relative_eq!(total.abs(), 84.0, epsilon = 1e-6);
    }
}
