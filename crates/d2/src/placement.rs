//! Greedy placement of an ordered, rotated part sequence.
//!
//! Parts are placed one sheet at a time. The first part of a sheet goes to
//! the left-most admissible translation; every later part goes to the
//! admissible vertex that keeps the occupied bounding box narrowest
//! (`2 * width + height`). Parts that fit nowhere on a sheet carry over to
//! the next one.

use crate::clipper::{Clipper, Shape};
use crate::nfp::{Nfp, NfpKey};
use crate::nfp_cache::NfpCache;
use crate::polygon::{self, locate_point, PointLocation};
use crate::tree::PolygonTree;
use polynest_core::{Bounds, Fitness, PartPlacement, PlacementResult, Point, PolygonId, SheetPlacement};

/// Every NFP key the placement of `order` may read.
///
/// One inside key per part, plus one outside key for each earlier part.
pub fn required_keys(order: &[(PolygonId, f64)]) -> Vec<NfpKey> {
    let mut keys = Vec::with_capacity(order.len() * (order.len() + 1) / 2);
    for (i, &(id, rotation)) in order.iter().enumerate() {
        keys.push(NfpKey::inside(id, rotation));
        for &(placed_id, placed_rotation) in &order[..i] {
            keys.push(NfpKey::outside(placed_id, id, placed_rotation, rotation));
        }
    }
    keys
}

/// Read-only inputs of the placement heuristic.
#[derive(Debug, Clone, Copy)]
pub struct Placer<'a> {
    /// Resolved NFPs.
    pub cache: &'a NfpCache,
    /// Offset, orientation-normalized parts.
    pub parts: &'a PolygonTree,
    /// Absolute area of the container.
    pub container_area: f64,
    /// Clipping adapter.
    pub clipper: &'a Clipper,
}

struct Candidate {
    id: PolygonId,
    rotation: f64,
    position: usize,
    bounds: Bounds,
    area: f64,
}

impl<'a> Placer<'a> {
    /// Places `order` and scores the outcome.
    pub fn place(&self, order: &[(PolygonId, f64)]) -> PlacementResult {
        let total = order.len();
        let mut unplaced: Vec<PolygonId> = Vec::new();
        let mut remaining: Vec<Candidate> = Vec::with_capacity(total);

        for (position, &(id, rotation)) in order.iter().enumerate() {
            let node_points = self.parts.get(id).map(|n| n.points.as_slice()).unwrap_or(&[]);
            let rotated = polygon::rotate(node_points, rotation);
            let fits = self
                .cache
                .get(&NfpKey::inside(id, rotation))
                .map_or(false, |nfp| !nfp.is_empty());

            match polygon::bounds(&rotated) {
                Some(bounds) if fits => remaining.push(Candidate {
                    id,
                    rotation,
                    position,
                    bounds,
                    area: polygon::area(&rotated).abs(),
                }),
                _ => unplaced.push(id),
            }
        }

        let total_area: f64 = remaining.iter().map(|c| c.area).sum();
        let mut sheets: Vec<SheetPlacement> = Vec::new();
        let mut order_penalty = 0.0;
        let mut last_sheet: Option<(Bounds, f64)> = None;

        while !remaining.is_empty() {
            let mut placed: SheetPlacement = Vec::new();
            let mut occupied: Option<Bounds> = None;
            let mut placed_area = 0.0;
            let mut carried = Vec::new();

            for candidate in remaining {
                match self.position_for(&candidate, &placed, occupied) {
                    Some(at) => {
                        let moved = Bounds::new(
                            candidate.bounds.x + at.x,
                            candidate.bounds.y + at.y,
                            candidate.bounds.width,
                            candidate.bounds.height,
                        );
                        occupied = Some(occupied.map_or(moved, |b| b.union(&moved)));
                        placed_area += candidate.area;
                        if total_area > 0.0 {
                            order_penalty += candidate.position as f64 / total as f64
                                * (candidate.area / total_area)
                                * 0.01;
                        }
                        placed.push(PartPlacement::new(candidate.id, at.x, at.y, candidate.rotation));
                    }
                    None => carried.push(candidate),
                }
            }

            if placed.is_empty() {
                unplaced.extend(carried.iter().map(|c| c.id));
                break;
            }

            last_sheet = occupied.map(|b| (b, placed_area));
            sheets.push(placed);
            remaining = carried;
        }

        let waste = match last_sheet {
            Some((b, area)) if b.area() > 0.0 && self.container_area > 0.0 => {
                let unused = (1.0 - area / b.area()).clamp(0.0, 1.0);
                let share = (b.area() / self.container_area).min(1.0);
                unused * share * 0.5
            }
            _ => 0.0,
        };

        PlacementResult {
            fitness: Fitness {
                unplaced: unplaced.len(),
                sheets: sheets.len(),
                waste,
                order_penalty,
                total,
            },
            sheets,
            unplaced,
        }
    }

    /// Translation for `candidate` on a sheet holding `placed`, if any.
    fn position_for(
        &self,
        candidate: &Candidate,
        placed: &[PartPlacement],
        occupied: Option<Bounds>,
    ) -> Option<Point> {
        let inside = self.cache.get(&NfpKey::inside(candidate.id, candidate.rotation))?;
        if inside.is_empty() {
            return None;
        }

        let Some(occupied) = occupied else {
            return inside
                .polygons
                .iter()
                .flatten()
                .copied()
                .min_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        };

        let mut forbidden: Vec<Nfp> = Vec::with_capacity(placed.len());
        for p in placed {
            let key = NfpKey::outside(p.id, candidate.id, p.rotation, candidate.rotation);
            match self.cache.get(&key) {
                Some(nfp) => forbidden.push(nfp.translated(p.x, p.y)),
                None => {
                    log::warn!("missing NFP {:?} during placement", key);
                    return None;
                }
            }
        }

        // Each region adds a winding of exactly one inside itself, so any
        // overlap of blocked regions stays non-zero.
        let mut blocked: Vec<Vec<Point>> = inside
            .holes
            .iter()
            .map(|h| polygon::with_orientation(h.clone(), true))
            .collect();
        for nfp in &forbidden {
            blocked.extend(self.region(nfp));
        }

        let tolerance = self.clipper.tolerance();
        let min_area = 0.1 * tolerance * tolerance;
        let region: Vec<Vec<Point>> = self
            .clipper
            .difference(&inside.polygons, &blocked)
            .into_iter()
            .filter(|l| polygon::area(l).abs() >= min_area)
            .collect();

        let mut points: Vec<Point> = region.into_iter().flatten().collect();
        if points.is_empty() {
            // Zero-width regions (exact fits) vanish under clipping; test the
            // raw vertices instead.
            points = inside
                .loops()
                .chain(forbidden.iter().flat_map(Nfp::loops))
                .flatten()
                .copied()
                .filter(|&p| admits(p, &inside) && !forbidden.iter().any(|nfp| is_forbidden(p, nfp)))
                .collect();
        }

        let mut best: Option<(f64, Point)> = None;
        for p in points {
            let moved = Bounds::new(
                candidate.bounds.x + p.x,
                candidate.bounds.y + p.y,
                candidate.bounds.width,
                candidate.bounds.height,
            );
            let b = occupied.union(&moved);
            let score = 2.0 * b.width + b.height;

            let better = match best {
                None => true,
                Some((best_score, best_point)) => {
                    let eps = 1e-9 * best_score.abs().max(1.0);
                    if score < best_score - eps {
                        true
                    } else if score > best_score + eps {
                        false
                    } else {
                        p.x < best_point.x || (p.x == best_point.x && p.y < best_point.y)
                    }
                }
            };
            if better {
                best = Some((score, p));
            }
        }

        best.map(|(_, p)| p)
    }

    /// Positive outer loops and negative holes filling `polygons - holes`.
    fn region(&self, nfp: &Nfp) -> Vec<Vec<Point>> {
        if nfp.holes.is_empty() {
            return nfp
                .polygons
                .iter()
                .map(|l| polygon::with_orientation(l.clone(), true))
                .collect();
        }
        self.clipper
            .difference_shapes(&nfp.polygons, &nfp.holes)
            .into_iter()
            .flat_map(Shape::into_oriented_loops)
            .collect()
    }
}

/// True if `p` lies in the admissible area of an inside NFP, boundary included.
fn admits(p: Point, inside: &Nfp) -> bool {
    inside.polygons.iter().any(|l| locate_point(p, l) != PointLocation::Outside)
        && inside.holes.iter().all(|h| locate_point(p, h) != PointLocation::Inside)
}

/// True if `p` is strictly inside the forbidden area of an outside NFP.
///
/// Points on a boundary, including the boundary of a hole, are free.
fn is_forbidden(p: Point, nfp: &Nfp) -> bool {
    nfp.polygons.iter().any(|l| locate_point(p, l) == PointLocation::Inside)
        && nfp.holes.iter().all(|h| locate_point(p, h) == PointLocation::Outside)
}
