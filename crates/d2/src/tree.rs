//! Containment tree of input polygons.
//!
//! Polygons are stored in an arena indexed by id. Ids are assigned
//! breadth-first (top-level parts first, then their holes, then islands
//! inside holes), so the index of a node is its id.

use crate::clipper::Clipper;
use crate::polygon::{self, loop_inside};
use polynest_core::{Point, PolygonId};
use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque handle to the caller's source element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceRef(pub u64);

/// One flattened input loop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartInput {
    /// Vertices, without a repeated closing point.
    pub points: Vec<Point>,
    /// Caller handle carried through to rendered output.
    pub source: Option<SourceRef>,
}

impl PartInput {
    /// Creates an input loop without a source handle.
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            source: None,
        }
    }

    /// Creates an input loop from `(x, y)` tuples.
    pub fn from_tuples(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().copied().map(Point::from).collect())
    }

    /// Attaches a source handle.
    pub fn with_source(mut self, source: u64) -> Self {
        self.source = Some(SourceRef(source));
        self
    }

    /// Creates an axis-aligned rectangle with its minimum corner at `(x, y)`.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(vec![
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }
}

/// A polygon in the containment tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonNode {
    /// Breadth-first id, equal to the arena index.
    pub id: PolygonId,
    /// Loop vertices.
    pub points: Vec<Point>,
    /// Caller handle.
    pub source: Option<SourceRef>,
    /// Innermost enclosing polygon.
    pub parent: Option<PolygonId>,
    /// Polygons directly inside this one, in id order.
    pub children: Vec<PolygonId>,
    /// Nesting depth; top-level parts are at depth 0.
    pub depth: usize,
}

impl PolygonNode {
    /// Odd depths are holes of the polygon above them.
    pub fn is_hole(&self) -> bool {
        self.depth % 2 == 1
    }

    /// Signed area of the loop.
    pub fn area(&self) -> f64 {
        polygon::area(&self.points)
    }
}

/// Arena of polygons linked by containment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonTree {
    nodes: Vec<PolygonNode>,
    roots: Vec<PolygonId>,
}

#[inline]
fn index(id: PolygonId) -> Option<usize> {
    usize::try_from(id).ok()
}

impl PolygonTree {
    /// Builds the tree from loops in input order.
    ///
    /// A loop's parent is the smallest larger loop containing it; ties go to
    /// the earlier input. Ids are unique and depend only on the input order.
    pub fn build(inputs: Vec<PartInput>) -> Self {
        let n = inputs.len();
        let areas: Vec<f64> = inputs.iter().map(|p| polygon::area(&p.points).abs()).collect();

        let mut parent_of: Vec<Option<usize>> = vec![None; n];
        for i in 0..n {
            let mut best: Option<usize> = None;
            for j in 0..n {
                if i == j || areas[j] <= areas[i] {
                    continue;
                }
                if !loop_inside(&inputs[i].points, &inputs[j].points) {
                    continue;
                }
                if best.map_or(true, |b| areas[j] < areas[b]) {
                    best = Some(j);
                }
            }
            parent_of[i] = best;
        }

        let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, parent) in parent_of.iter().enumerate() {
            if let Some(p) = parent {
                children_of[*p].push(i);
            }
        }

        // Breadth-first numbering.
        let mut new_id: Vec<PolygonId> = vec![-1; n];
        let mut order: Vec<(usize, usize)> = Vec::with_capacity(n);
        let mut queue: VecDeque<(usize, usize)> = (0..n)
            .filter(|&i| parent_of[i].is_none())
            .map(|i| (i, 0))
            .collect();
        while let Some((i, depth)) = queue.pop_front() {
            new_id[i] = order.len() as PolygonId;
            order.push((i, depth));
            queue.extend(children_of[i].iter().map(|&c| (c, depth + 1)));
        }

        let mut slots: Vec<Option<PartInput>> = inputs.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for &(i, depth) in &order {
            let Some(input) = slots[i].take() else {
                continue;
            };
            nodes.push(PolygonNode {
                id: new_id[i],
                points: input.points,
                source: input.source,
                parent: parent_of[i].map(|p| new_id[p]),
                children: children_of[i].iter().map(|&c| new_id[c]).collect(),
                depth,
            });
        }

        let roots = nodes
            .iter()
            .filter(|node| node.parent.is_none())
            .map(|node| node.id)
            .collect();

        Self { nodes, roots }
    }

    /// Number of polygons at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no polygons.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node with the given id.
    pub fn get(&self, id: PolygonId) -> Option<&PolygonNode> {
        index(id).and_then(|i| self.nodes.get(i))
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> &[PolygonNode] {
        &self.nodes
    }

    /// Ids of the top-level parts.
    pub fn roots(&self) -> &[PolygonId] {
        &self.roots
    }

    /// Direct children of `id`.
    pub fn children(&self, id: PolygonId) -> &[PolygonId] {
        match self.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Every descendant of `id` depth-first, each with its hole flag.
    ///
    /// Direct children are holes; the flag alternates with each level.
    pub fn flatten(&self, id: PolygonId) -> Vec<(&PolygonNode, bool)> {
        let mut out = Vec::new();
        self.flatten_into(self.children(id), true, &mut out);
        out
    }

    fn flatten_into<'a>(&'a self, ids: &[PolygonId], hole: bool, out: &mut Vec<(&'a PolygonNode, bool)>) {
        for &id in ids {
            if let Some(node) = self.get(id) {
                out.push((node, hole));
                self.flatten_into(&node.children, !hole, out);
            }
        }
    }

    /// Offsets every loop, alternating the sign per depth.
    ///
    /// Top-level loops move by `distance`, their children by `-distance`, and
    /// so on. A loop is replaced only when the offset yields exactly one loop.
    pub fn offset(&self, clipper: &Clipper, distance: f64) -> Self {
        let mut tree = self.clone();
        if distance == 0.0 {
            return tree;
        }

        for node in tree.nodes.iter_mut() {
            let d = if node.depth % 2 == 0 { distance } else { -distance };
            let mut offsets = clipper.offset(&node.points, d);
            if offsets.len() == 1 {
                if let Some(points) = offsets.pop() {
                    node.points = points;
                }
            }
        }
        tree
    }

    /// Normalizes the orientation of every loop to non-positive area.
    pub fn normalize_orientation(&mut self) {
        for node in self.nodes.iter_mut() {
            node.points = polygon::normalize_orientation(&node.points);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use polynest_core::Config;
    use std::collections::HashSet;

    fn nested_input() -> Vec<PartInput> {
        vec![
            PartInput::rectangle(2.0, 2.0, 6.0, 6.0).with_source(1),
            PartInput::rectangle(20.0, 0.0, 5.0, 5.0).with_source(2),
            PartInput::rectangle(0.0, 0.0, 10.0, 10.0).with_source(3),
            PartInput::rectangle(4.0, 4.0, 2.0, 2.0).with_source(4),
            PartInput::rectangle(21.0, 1.0, 1.0, 1.0).with_source(5),
        ]
    }

    #[test]
    fn test_build_breadth_first_ids() {
        let tree = PolygonTree::build(nested_input());
        assert_eq!(tree.len(), 5);

        // Roots in input order: the 5x5 square, then the 10x10 square.
        assert_eq!(tree.roots(), &[0, 1]);
        assert_eq!(tree.get(0).unwrap().source, Some(SourceRef(2)));
        assert_eq!(tree.get(1).unwrap().source, Some(SourceRef(3)));

        // Depth-1 children follow.
        assert_eq!(tree.children(0), &[2]);
        assert_eq!(tree.children(1), &[3]);
        assert_eq!(tree.get(2).unwrap().source, Some(SourceRef(5)));
        assert_eq!(tree.get(3).unwrap().source, Some(SourceRef(1)));

        // Island inside the hole.
        assert_eq!(tree.children(3), &[4]);
        assert_eq!(tree.get(4).unwrap().depth, 2);
        assert!(!tree.get(4).unwrap().is_hole());
        assert!(tree.get(3).unwrap().is_hole());

        for (i, node) in tree.nodes().iter().enumerate() {
            assert_eq!(node.id as usize, i);
        }
    }

    #[test]
    fn test_ids_unique_and_deterministic() {
        let a = PolygonTree::build(nested_input());
        let b = PolygonTree::build(nested_input());
        assert_eq!(a, b);

        let ids: HashSet<PolygonId> = a.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), a.len());
    }

    #[test]
    fn test_innermost_parent_wins() {
        let tree = PolygonTree::build(nested_input());
        let island = tree.get(4).unwrap();
        assert_eq!(island.parent, Some(3));
    }

    #[test]
    fn test_flatten_alternates_holes() {
        let tree = PolygonTree::build(nested_input());
        let flat: Vec<(PolygonId, bool)> = tree.flatten(1).iter().map(|(n, h)| (n.id, *h)).collect();
        assert_eq!(flat, vec![(3, true), (4, false)]);
        assert!(tree.flatten(2).is_empty());
    }

    #[test]
    fn test_offset_alternates_sign() {
        let tree = PolygonTree::build(nested_input());
        let clipper = Clipper::new(&Config::default());
        let grown = tree.offset(&clipper, 0.5);

        let outer = polygon::bounds(&grown.get(1).unwrap().points).unwrap();
        assert_relative_eq!(outer.width, 11.0, epsilon = 1e-6);

        let hole = polygon::bounds(&grown.get(3).unwrap().points).unwrap();
        assert_relative_eq!(hole.width, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_orientation() {
        let mut tree = PolygonTree::build(nested_input());
        tree.normalize_orientation();
        assert!(tree.nodes().iter().all(|n| n.area() <= 0.0));
    }
}
