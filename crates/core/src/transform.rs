//! Rigid placement transform and axis-aligned bounds.

use crate::geometry::Point;
use nalgebra::{Isometry2, Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D rigid transformation: rotation about the origin, then translation.
///
/// The angle is stored in degrees because rotation genes are degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform2D {
    /// Translation in x direction.
    pub tx: f64,
    /// Translation in y direction.
    pub ty: f64,
    /// Rotation angle in degrees.
    pub rotation: f64,
}

impl Transform2D {
    /// Creates the identity transform.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Creates a transform with both translation and rotation.
    pub fn new(tx: f64, ty: f64, rotation: f64) -> Self {
        Self { tx, ty, rotation }
    }

    /// Converts to a nalgebra Isometry2.
    pub fn to_isometry(&self) -> Isometry2<f64> {
        Isometry2::new(Vector2::new(self.tx, self.ty), self.rotation.to_radians())
    }

    /// Creates from a nalgebra Isometry2.
    pub fn from_isometry(iso: &Isometry2<f64>) -> Self {
        Self {
            tx: iso.translation.x,
            ty: iso.translation.y,
            rotation: iso.rotation.angle().to_degrees(),
        }
    }

    /// Transforms a single point.
    pub fn apply(&self, point: Point) -> Point {
        let p = self.to_isometry().transform_point(&Point2::new(point.x, point.y));
        Point::new(p.x, p.y)
    }

    /// Transforms a sequence of points.
    pub fn apply_all(&self, points: &[Point]) -> Vec<Point> {
        let iso = self.to_isometry();
        points
            .iter()
            .map(|pt| {
                let p = iso.transform_point(&Point2::new(pt.x, pt.y));
                Point::new(p.x, p.y)
            })
            .collect()
    }

    /// Returns the inverse transform.
    pub fn inverse(&self) -> Self {
        Self::from_isometry(&self.to_isometry().inverse())
    }
}

/// Axis-aligned bounds in the `(x, y, width, height)` form.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    /// Minimum x coordinate.
    pub x: f64,
    /// Minimum y coordinate.
    pub y: f64,
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

impl Bounds {
    /// Creates bounds from a minimum corner and extents.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Computes the bounds of a point set.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Maximum x coordinate.
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Maximum y coordinate.
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Area of the box.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns the bounding box of both boxes.
    pub fn union(&self, other: &Self) -> Self {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Returns true if a box of this size fits strictly inside `other`'s size.
    pub fn fits_within(&self, other: &Self) -> bool {
        self.width < other.width && self.height < other.height
    }
}
