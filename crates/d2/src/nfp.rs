//! No-Fit Polygon (NFP) computation.
//!
//! All NFPs live in translation space: a point `t` of an NFP is a translation
//! of the orbiting part's local origin.
//!
//! - **Outside NFP** of a stationary part A and an orbiting part B: the
//!   translations that make B overlap A, i.e. `A ⊕ (-B)`. Convex pairs use
//!   the edge-merge Minkowski sum; other pairs are decomposed into convex
//!   pieces whose pairwise sums are unioned with `i_overlay`.
//! - **Inside NFP** of a container C and a part B: the translations that keep
//!   B inside C. Rectangles take a closed-form path; other containers remove
//!   every translation where a piece of B crosses an edge of C.

use crate::clipper::Clipper;
use crate::polygon::{self, with_orientation};
use polynest_core::robust::{orient2d, point_in_triangle};
use polynest_core::{Config, Error, Point, PolygonId, Result, CONTAINER_ID};
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

/// Identifies one NFP computation.
///
/// Spacing and tolerance are not part of the key: the cache holding keys is
/// cleared whenever the configuration changes.
#[derive(Debug, Clone, Copy)]
pub struct NfpKey {
    /// Stationary polygon id, [`CONTAINER_ID`] for inside NFPs.
    pub a: PolygonId,
    /// Orbiting polygon id.
    pub b: PolygonId,
    /// Inside (container) or outside (part) NFP.
    pub inside: bool,
    /// Rotation of A in degrees.
    pub rotation_a: f64,
    /// Rotation of B in degrees.
    pub rotation_b: f64,
}

impl NfpKey {
    /// Key of the outside NFP of `b` orbiting the placed part `a`.
    pub fn outside(a: PolygonId, b: PolygonId, rotation_a: f64, rotation_b: f64) -> Self {
        Self {
            a,
            b,
            inside: false,
            rotation_a,
            rotation_b,
        }
    }

    /// Key of the inside NFP of `b` within the container.
    pub fn inside(b: PolygonId, rotation_b: f64) -> Self {
        Self {
            a: CONTAINER_ID,
            b,
            inside: true,
            rotation_a: 0.0,
            rotation_b,
        }
    }

    #[inline]
    fn angle_bits(angle: f64) -> u64 {
        // -0.0 and 0.0 are the same rotation.
        if angle == 0.0 {
            0.0f64.to_bits()
        } else {
            angle.to_bits()
        }
    }
}

impl PartialEq for NfpKey {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a
            && self.b == other.b
            && self.inside == other.inside
            && Self::angle_bits(self.rotation_a) == Self::angle_bits(other.rotation_a)
            && Self::angle_bits(self.rotation_b) == Self::angle_bits(other.rotation_b)
    }
}

impl Eq for NfpKey {}

impl Hash for NfpKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.a.hash(state);
        self.b.hash(state);
        self.inside.hash(state);
        Self::angle_bits(self.rotation_a).hash(state);
        Self::angle_bits(self.rotation_b).hash(state);
    }
}

/// NFP computation result.
///
/// The region an NFP describes is `polygons` minus `holes`: the forbidden
/// translations of an outside NFP, the admissible ones of an inside NFP.
/// Stored NFPs keep every loop with non-positive area, so the sign of a loop
/// never says which list it belongs to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nfp {
    /// Outer loops of the region.
    pub polygons: Vec<Vec<Point>>,
    /// Loops cut out of the region: concavities and hole interiors of an
    /// outside NFP, holes of an inside NFP's admissible area.
    pub holes: Vec<Vec<Point>>,
}

impl Nfp {
    /// Creates a new empty NFP.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an NFP with a single loop.
    pub fn from_polygon(polygon: Vec<Point>) -> Self {
        Self::from_polygons(vec![polygon])
    }

    /// Creates an NFP with multiple loops and no holes.
    pub fn from_polygons(polygons: Vec<Vec<Point>>) -> Self {
        Self {
            polygons,
            holes: Vec::new(),
        }
    }

    /// Returns true if the NFP has no outer loop.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Every loop, outer loops first.
    pub fn loops(&self) -> impl Iterator<Item = &Vec<Point>> {
        self.polygons.iter().chain(self.holes.iter())
    }

    /// Reverses every loop with positive signed area.
    pub fn normalized(self) -> Self {
        let normalize = |loops: Vec<Vec<Point>>| -> Vec<Vec<Point>> {
            loops.into_iter().map(|l| with_orientation(l, false)).collect()
        };
        Self {
            polygons: normalize(self.polygons),
            holes: normalize(self.holes),
        }
    }

    /// Returns the NFP shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let shift = |loops: &[Vec<Point>]| -> Vec<Vec<Point>> {
            loops.iter().map(|l| polygon::translate(l, dx, dy)).collect()
        };
        Self {
            polygons: shift(&self.polygons),
            holes: shift(&self.holes),
        }
    }
}

/// Options that change how an NFP is computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NfpOptions {
    /// Keep the concavities B can slide into.
    pub explore_concave: bool,
    /// Cut the inside NFPs of A's holes out of the outside NFP.
    pub use_holes: bool,
}

impl NfpOptions {
    /// Reads the options from a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            explore_concave: config.explore_concave,
            use_holes: config.use_holes,
        }
    }
}

/// Geometry for one key, already rotated.
#[derive(Debug, Clone)]
pub struct NfpJob {
    /// The key this job resolves.
    pub key: NfpKey,
    /// Stationary loop: the container for inside NFPs, part A otherwise.
    pub a: Vec<Point>,
    /// Holes of A, used for outside NFPs with `use_holes`.
    pub a_holes: Vec<Vec<Point>>,
    /// Orbiting part B.
    pub b: Vec<Point>,
}

/// Computes the NFP a job describes.
///
/// Degenerate input yields an empty NFP. An outside NFP that collapses under
/// clipping is an error.
pub fn compute_nfp(job: &NfpJob, clipper: &Clipper, options: &NfpOptions) -> Result<Nfp> {
    if job.a.len() < 3 || job.b.len() < 3 {
        return Ok(Nfp::new());
    }

    if job.key.inside {
        return Ok(inside_nfp(&job.a, &job.b, clipper, options.explore_concave));
    }

    let mut nfp = outside_nfp(&job.a, &job.b, clipper, options.explore_concave);
    if nfp.is_empty() {
        return Err(Error::NfpError(format!(
            "outside NFP of {} and {} collapsed",
            job.key.a, job.key.b
        )));
    }

    if options.use_holes {
        let Some(b_bounds) = polygon::bounds(&job.b) else {
            return Ok(nfp);
        };
        for hole in &job.a_holes {
            let fits = polygon::bounds(hole).map_or(false, |h| b_bounds.fits_within(&h));
            if !fits {
                continue;
            }
            let inner = inside_nfp(hole, &job.b, clipper, false);
            // A free area with forbidden islands of its own cannot be
            // expressed as a hole; leaving it out only loses candidates.
            if !inner.holes.is_empty() {
                log::debug!("skipping hole of {} with a split admissible area", job.key.a);
                continue;
            }
            nfp.holes.extend(inner.polygons);
        }
    }

    Ok(nfp.normalized())
}

/// Outside NFP of `b` orbiting `a`, normalized.
///
/// Without `explore_concave` the concavities enclosed by the outer boundary
/// are left forbidden.
pub fn outside_nfp(a: &[Point], b: &[Point], clipper: &Clipper, explore_concave: bool) -> Nfp {
    if a.len() < 3 || b.len() < 3 {
        return Nfp::new();
    }

    let reflected: Vec<Point> = b.iter().map(|p| Point::new(-p.x, -p.y)).collect();

    if polygon::is_convex_loop(a) && polygon::is_convex_loop(b) {
        return Nfp::from_polygon(minkowski_sum_convex(a, &reflected)).normalized();
    }

    let pieces_a = convex_pieces(a);
    let pieces_b = convex_pieces(&reflected);
    let mut partial = Vec::with_capacity(pieces_a.len() * pieces_b.len());
    for pa in &pieces_a {
        for pb in &pieces_b {
            let sum = convex_sum_hull(pa, pb);
            if sum.len() >= 3 {
                partial.push(sum);
            }
        }
    }

    let mut shapes = clipper.union_shapes(&partial);
    if shapes.is_empty() {
        return Nfp::new();
    }

    // Outer boundary first.
    shapes.sort_by(|x, y| polygon::area(&y.outer).abs().total_cmp(&polygon::area(&x.outer).abs()));

    let min_area = clipper.tolerance() * clipper.tolerance() * 0.1;
    let mut nfp = Nfp::new();
    for (i, shape) in shapes.into_iter().enumerate() {
        if i > 0 && polygon::area(&shape.outer).abs() <= min_area {
            continue;
        }
        nfp.polygons.push(shape.outer);
        if explore_concave {
            nfp.holes
                .extend(shape.holes.into_iter().filter(|h| polygon::area(h).abs() > min_area));
        }
    }

    nfp.normalized()
}

/// Inside NFP of `b` within `container`, normalized.
///
/// Empty when `b` cannot fit. Without `explore_concave` only the largest
/// admissible area is kept.
pub fn inside_nfp(container: &[Point], b: &[Point], clipper: &Clipper, explore_concave: bool) -> Nfp {
    let (Some(cb), Some(bb)) = (polygon::bounds(container), polygon::bounds(b)) else {
        return Nfp::new();
    };
    if container.len() < 3 || b.len() < 3 || bb.width > cb.width || bb.height > cb.height {
        return Nfp::new();
    }

    if polygon::is_rectangle(container, polygon::TOL) {
        let x0 = cb.x - bb.x;
        let y0 = cb.y - bb.y;
        let x1 = cb.max_x() - bb.max_x();
        let y1 = cb.max_y() - bb.max_y();
        return Nfp::from_polygon(vec![
            Point::new(x0, y0),
            Point::new(x0, y1),
            Point::new(x1, y1),
            Point::new(x1, y0),
        ]);
    }

    // Translations placing b's first vertex inside the container.
    let anchor = b[0];
    let region = polygon::translate(container, -anchor.x, -anchor.y);

    // Translations where some piece of b crosses a container edge.
    let pieces_b: Vec<Vec<Point>> = convex_pieces(b)
        .into_iter()
        .map(|piece| piece.iter().map(|p| Point::new(-p.x, -p.y)).collect())
        .collect();
    let n = container.len();
    let mut crossing = Vec::with_capacity(n * pieces_b.len());
    for i in 0..n {
        let edge = [container[i], container[(i + 1) % n]];
        for piece in &pieces_b {
            let sum = convex_sum_hull(&edge, piece);
            if sum.len() >= 3 {
                crossing.push(sum);
            }
        }
    }

    let mut shapes = clipper.difference_shapes(&[region], &crossing);
    if shapes.is_empty() {
        return Nfp::new();
    }

    if !explore_concave {
        let largest = shapes
            .into_iter()
            .max_by(|x, y| polygon::area(&x.outer).abs().total_cmp(&polygon::area(&y.outer).abs()));
        shapes = largest.into_iter().collect();
    }

    let mut nfp = Nfp::new();
    for shape in shapes {
        nfp.polygons.push(shape.outer);
        nfp.holes.extend(shape.holes);
    }
    nfp.normalized()
}

/// Minkowski sum of two convex loops by merging edge vectors by angle.
pub fn minkowski_sum_convex(a: &[Point], b: &[Point]) -> Vec<Point> {
    let a = with_orientation(a.to_vec(), true);
    let b = with_orientation(b.to_vec(), true);

    let edges_a = edge_vectors(&a);
    let edges_b = edge_vectors(&b);
    let start_a = bottom_left_vertex(&a);
    let start_b = bottom_left_vertex(&b);

    let mut current = Point::new(a[start_a].x + b[start_b].x, a[start_a].y + b[start_b].y);
    let merged = merge_edge_vectors(&edges_a, start_a, &edges_b, start_b);

    let mut result = Vec::with_capacity(merged.len() + 1);
    result.push(current);
    for (dx, dy) in merged {
        current = current.translated(dx, dy);
        result.push(current);
    }

    if result.len() > 1 {
        let first = result[0];
        if result
            .last()
            .map_or(false, |last| first.distance(*last) < 1e-10)
        {
            result.pop();
        }
    }

    result
}

/// Convex hull of all pairwise vertex sums, the Minkowski sum of two convex sets.
fn convex_sum_hull(a: &[Point], b: &[Point]) -> Vec<Point> {
    let sums: Vec<Point> = a
        .iter()
        .flat_map(|pa| b.iter().map(move |pb| Point::new(pa.x + pb.x, pa.y + pb.y)))
        .collect();
    polygon::convex_hull(&sums)
}

/// Splits a loop into convex pieces by ear clipping.
///
/// Convex loops are returned whole; loops without an ear fall back to
/// their convex hull.
fn convex_pieces(points: &[Point]) -> Vec<Vec<Point>> {
    if points.len() < 3 {
        return Vec::new();
    }
    if polygon::is_convex_loop(points) {
        return vec![points.to_vec()];
    }

    let mut vertices = with_orientation(points.to_vec(), true);
    let mut triangles = Vec::with_capacity(vertices.len().saturating_sub(2));

    while vertices.len() > 3 {
        let n = vertices.len();
        let ear = (0..n).find(|&i| is_ear(&vertices, (i + n - 1) % n, i, (i + 1) % n));

        match ear {
            Some(i) => {
                let prev = vertices[(i + n - 1) % n];
                let next = vertices[(i + 1) % n];
                triangles.push(vec![prev, vertices[i], next]);
                vertices.remove(i);
            }
            None => {
                // Collinear leftovers have no ear.
                if let Some(i) =
                    (0..n).find(|&i| orient2d(vertices[(i + n - 1) % n], vertices[i], vertices[(i + 1) % n]).is_collinear())
                {
                    vertices.remove(i);
                    continue;
                }
                return vec![polygon::convex_hull(points)];
            }
        }
    }

    if vertices.len() == 3 && !orient2d(vertices[0], vertices[1], vertices[2]).is_collinear() {
        triangles.push(vertices);
    }

    triangles
}

fn is_ear(vertices: &[Point], prev: usize, curr: usize, next: usize) -> bool {
    let (a, b, c) = (vertices[prev], vertices[curr], vertices[next]);
    if !orient2d(a, b, c).is_ccw() {
        return false;
    }

    vertices.iter().enumerate().all(|(i, &p)| {
        i == prev || i == curr || i == next || p == a || p == b || p == c || !point_in_triangle(p, a, b, c)
    })
}

fn edge_vectors(points: &[Point]) -> Vec<(f64, f64)> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            (points[j].x - points[i].x, points[j].y - points[i].y)
        })
        .collect()
}

/// Index of the bottom-most, then left-most vertex.
fn bottom_left_vertex(points: &[Point]) -> usize {
    let mut min_idx = 0;
    for (i, p) in points.iter().enumerate() {
        let m = points[min_idx];
        if p.y < m.y || (p.y == m.y && p.x < m.x) {
            min_idx = i;
        }
    }
    min_idx
}

/// Angle of an edge vector in `[0, 2π)`.
fn edge_angle(dx: f64, dy: f64) -> f64 {
    let angle = dy.atan2(dx);
    if angle < 0.0 {
        angle + 2.0 * PI
    } else {
        angle
    }
}

fn merge_edge_vectors(
    edges_a: &[(f64, f64)],
    start_a: usize,
    edges_b: &[(f64, f64)],
    start_b: usize,
) -> Vec<(f64, f64)> {
    let n_a = edges_a.len();
    let n_b = edges_b.len();
    let mut result = Vec::with_capacity(n_a + n_b);
    let (mut i_a, mut i_b) = (0, 0);

    while i_a < n_a || i_b < n_b {
        if i_a >= n_a {
            result.push(edges_b[(start_b + i_b) % n_b]);
            i_b += 1;
        } else if i_b >= n_b {
            result.push(edges_a[(start_a + i_a) % n_a]);
            i_a += 1;
        } else {
            let ea = edges_a[(start_a + i_a) % n_a];
            let eb = edges_b[(start_b + i_b) % n_b];
            let angle_a = edge_angle(ea.0, ea.1);
            let angle_b = edge_angle(eb.0, eb.1);

            if angle_a <= angle_b + 1e-10 {
                result.push(ea);
                i_a += 1;
            }
            if angle_b <= angle_a + 1e-10 {
                result.push(eb);
                i_b += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::{area, bounds};
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ]
    }

    fn l_shape() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 4.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    fn clipper() -> Clipper {
        Clipper::new(&Config::default())
    }

    #[test]
    fn test_key_equality_ignores_zero_sign() {
        let a = NfpKey::outside(1, 2, 0.0, 90.0);
        let b = NfpKey::outside(1, 2, -0.0, 90.0);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&NfpKey::outside(2, 1, 0.0, 90.0)));
        assert!(!set.contains(&NfpKey::inside(2, 90.0)));
    }

    #[test]
    fn test_outside_nfp_two_squares() {
        let nfp = outside_nfp(&rect(0.0, 0.0, 10.0, 10.0), &rect(0.0, 0.0, 5.0, 5.0), &clipper(), false);
        assert_eq!(nfp.polygons.len(), 1);
        let b = bounds(&nfp.polygons[0]).unwrap();
        assert_relative_eq!(b.x, -5.0, epsilon = 1e-9);
        assert_relative_eq!(b.y, -5.0, epsilon = 1e-9);
        assert_relative_eq!(b.width, 15.0, epsilon = 1e-9);
        assert_relative_eq!(area(&nfp.polygons[0]), -225.0, epsilon = 1e-9);
    }

    #[test]
    fn test_outside_nfp_concave_outer_boundary() {
        let nfp = outside_nfp(&l_shape(), &rect(0.0, 0.0, 2.0, 2.0), &clipper(), false);
        assert_eq!(nfp.polygons.len(), 1);
        // Both legs of the L grow by 2 toward -x and -y.
        assert_relative_eq!(area(&nfp.polygons[0]), -(12.0 * 6.0 + 6.0 * 12.0 - 36.0), epsilon = 1e-6);
        assert!(nfp.polygons[0].iter().all(|p| p.x >= -2.0 - 1e-9 && p.y >= -2.0 - 1e-9));
    }

    fn assert_normalized(nfp: &Nfp) {
        assert!(nfp.loops().all(|l| area(l) <= 0.0), "positive loop in {nfp:?}");
    }

    #[test]
    fn test_outside_nfp_concavity_is_a_hole() {
        // A square ring with a 6x6 cavity and a mouth too narrow for the part.
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(5.5, 10.0),
            Point::new(5.5, 8.0),
            Point::new(8.0, 8.0),
            Point::new(8.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 8.0),
            Point::new(4.5, 8.0),
            Point::new(4.5, 10.0),
            Point::new(0.0, 10.0),
        ];
        let part = rect(0.0, 0.0, 2.0, 2.0);

        let concave = outside_nfp(&ring, &part, &clipper(), true);
        assert_eq!(concave.polygons.len(), 1);
        assert_eq!(concave.holes.len(), 1);
        assert_relative_eq!(area(&concave.holes[0]), -16.0, epsilon = 1e-6);
        assert_normalized(&concave);

        let approx = outside_nfp(&ring, &part, &clipper(), false);
        assert_eq!(approx.polygons.len(), 1);
        assert!(approx.holes.is_empty());
    }

    #[test]
    fn test_inside_nfp_rectangle() {
        let nfp = inside_nfp(&rect(0.0, 0.0, 20.0, 10.0), &rect(5.0, 5.0, 4.0, 3.0), &clipper(), false);
        let b = bounds(&nfp.polygons[0]).unwrap();
        assert_relative_eq!(b.x, -5.0);
        assert_relative_eq!(b.y, -5.0);
        assert_relative_eq!(b.width, 16.0);
        assert_relative_eq!(b.height, 7.0);
    }

    #[test]
    fn test_inside_nfp_loops_are_normalized() {
        let part = rect(0.0, 0.0, 10.0, 10.0);

        let square = inside_nfp(&rect(0.0, 0.0, 100.0, 100.0), &part, &clipper(), false);
        assert_eq!(square.polygons.len(), 1);
        assert_relative_eq!(area(&square.polygons[0]), -8100.0, epsilon = 1e-6);

        let l = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 40.0),
            Point::new(40.0, 40.0),
            Point::new(40.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        let l_nfp = inside_nfp(&l, &part, &clipper(), true);
        assert!(!l_nfp.is_empty());
        assert_relative_eq!(
            l_nfp.polygons.iter().map(|p| area(p)).sum::<f64>(),
            -(90.0 * 30.0 + 30.0 * 90.0 - 900.0),
            epsilon = 1e-6
        );
        assert_normalized(&l_nfp);
    }

    #[test]
    fn test_inside_nfp_too_large_is_empty() {
        let nfp = inside_nfp(&rect(0.0, 0.0, 10.0, 10.0), &rect(0.0, 0.0, 11.0, 1.0), &clipper(), false);
        assert!(nfp.is_empty());
    }

    #[test]
    fn test_inside_nfp_exact_fit_is_degenerate_rectangle() {
        let nfp = inside_nfp(&rect(0.0, 0.0, 20.0, 10.0), &rect(0.0, 0.0, 10.0, 10.0), &clipper(), false);
        let b = bounds(&nfp.polygons[0]).unwrap();
        assert_relative_eq!(b.width, 10.0);
        assert_relative_eq!(b.height, 0.0);
    }

    #[test]
    fn test_inside_nfp_concave_container() {
        let nfp = inside_nfp(&l_shape(), &rect(0.0, 0.0, 2.0, 2.0), &clipper(), false);
        assert_eq!(nfp.polygons.len(), 1);
        // L-shaped region of legs 8 x 2 and 2 x 8 sharing a 2 x 2 corner.
        assert_relative_eq!(area(&nfp.polygons[0]), -(8.0 * 2.0 + 2.0 * 8.0 - 4.0), epsilon = 1e-6);
        let b = bounds(&nfp.polygons[0]).unwrap();
        assert_relative_eq!(b.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(b.max_x(), 8.0, epsilon = 1e-6);
    }

    #[test]
    fn test_convex_pieces_cover_area() {
        let pieces = convex_pieces(&l_shape());
        let total: f64 = pieces.iter().map(|p| area(p).abs()).sum();
        assert_relative_eq!(total, 64.0, epsilon = 1e-9);
    }

    #[test]
    fn test_minkowski_sum_convex() {
        let sum = minkowski_sum_convex(&rect(0.0, 0.0, 2.0, 2.0), &rect(0.0, 0.0, 1.0, 3.0));
        assert_relative_eq!(area(&sum), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_compute_nfp_degenerate_input_is_empty() {
        let job = NfpJob {
            key: NfpKey::outside(0, 1, 0.0, 0.0),
            a: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
            a_holes: Vec::new(),
            b: rect(0.0, 0.0, 1.0, 1.0),
        };
        let options = NfpOptions::from_config(&Config::default());
        assert!(compute_nfp(&job, &clipper(), &options).unwrap().is_empty());
    }

    #[test]
    fn test_compute_nfp_with_holes() {
        let job = NfpJob {
            key: NfpKey::outside(0, 1, 0.0, 0.0),
            a: rect(0.0, 0.0, 10.0, 10.0),
            a_holes: vec![rect(2.0, 2.0, 6.0, 6.0)],
            b: rect(0.0, 0.0, 2.0, 2.0),
        };
        let options = NfpOptions {
            explore_concave: false,
            use_holes: true,
        };
        let nfp = compute_nfp(&job, &clipper(), &options).unwrap();
        assert_eq!(nfp.polygons.len(), 1);
        assert_eq!(nfp.holes.len(), 1);
        assert_relative_eq!(area(&nfp.holes[0]), -16.0, epsilon = 1e-9);
        assert_normalized(&nfp);

        // The part does not fit a 1x1 hole.
        let tight = NfpJob {
            a_holes: vec![rect(4.0, 4.0, 1.0, 1.0)],
            ..job
        };
        assert!(compute_nfp(&tight, &clipper(), &options).unwrap().holes.is_empty());
    }

    #[test]
    fn test_normalized_reverses_positive_loops() {
        let nfp = Nfp {
            polygons: vec![rect(0.0, 0.0, 4.0, 4.0)],
            holes: vec![polygon::with_orientation(rect(1.0, 1.0, 1.0, 1.0), true)],
        };
        let normalized = nfp.clone().normalized();
        assert_normalized(&normalized);
        assert_relative_eq!(area(&normalized.polygons[0]), -16.0, epsilon = 1e-9);
        assert_eq!(normalized.clone().normalized(), normalized);

        let moved = normalized.translated(10.0, -2.0);
        assert_eq!(moved.holes[0][0], normalized.holes[0][0].translated(10.0, -2.0));
    }
}
