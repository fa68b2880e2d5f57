//! Placement results and their fitness.

use crate::geometry::PolygonId;
use crate::transform::Transform2D;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where one part ended up on a sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartPlacement {
    /// Id of the placed part.
    pub id: PolygonId,
    /// Translation along x, applied after rotation.
    pub x: f64,
    /// Translation along y, applied after rotation.
    pub y: f64,
    /// Rotation about the part's local origin, in degrees.
    pub rotation: f64,
}

impl PartPlacement {
    /// Creates a new part placement.
    pub fn new(id: PolygonId, x: f64, y: f64, rotation: f64) -> Self {
        Self { id, x, y, rotation }
    }

    /// The rigid transform taking the part from its local frame to the sheet.
    pub fn transform(&self) -> Transform2D {
        Transform2D::new(self.x, self.y, self.rotation)
    }
}

/// Ordered placements on one container instance.
pub type SheetPlacement = Vec<PartPlacement>;

/// Quality of a candidate solution. Lower is better.
///
/// Comparison is lexicographic: fewer unplaced parts always wins, then fewer
/// sheets, then the blended secondary score (`waste + order_penalty`).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fitness {
    /// Parts that could not be placed on any sheet.
    pub unplaced: usize,
    /// Number of container instances used.
    pub sheets: usize,
    /// Wasted-area term of the last sheet, in `[0, 0.5]`.
    pub waste: f64,
    /// Order tie-breaker, in `[0, 0.01)`.
    pub order_penalty: f64,
    /// Number of parts the individual tried to place.
    pub total: usize,
}

impl Fitness {
    /// Secondary score compared once unplaced and sheet counts tie.
    pub fn secondary(&self) -> f64 {
        self.waste + self.order_penalty
    }

    /// Scalar form whose ordering agrees with [`Fitness::compare`].
    ///
    /// Sheets never exceed the part count, so one extra unplaced part
    /// (`total + 1`) outweighs any difference in sheets, and the secondary
    /// score stays below one sheet.
    pub fn value(&self) -> f64 {
        self.unplaced as f64 * (self.total as f64 + 1.0) + self.sheets as f64 + self.secondary()
    }

    /// Lexicographic comparison.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.unplaced
            .cmp(&other.unplaced)
            .then(self.sheets.cmp(&other.sheets))
            .then(self.secondary().total_cmp(&other.secondary()))
    }

    /// Returns true if `self` is strictly better than `other`.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Less
    }
}

impl PartialEq for Fitness {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

/// One full candidate solution, possibly spanning several sheets.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementResult {
    /// Fitness of this solution.
    pub fitness: Fitness,
    /// One placement list per container instance used.
    pub sheets: Vec<SheetPlacement>,
    /// Parts that fit on no sheet.
    pub unplaced: Vec<PolygonId>,
}

impl PlacementResult {
    /// Number of placed parts across all sheets.
    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(Vec::len).sum()
    }

    /// Iterates every placement on every sheet with its sheet index.
    pub fn placements(&self) -> impl Iterator<Item = (usize, &PartPlacement)> {
        self.sheets
            .iter()
            .enumerate()
            .flat_map(|(i, sheet)| sheet.iter().map(move |p| (i, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitness(unplaced: usize, sheets: usize, waste: f64) -> Fitness {
        Fitness {
            unplaced,
            sheets,
            waste,
            order_penalty: 0.0,
            total: 5,
        }
    }

    #[test]
    fn test_unplaced_dominates_sheets() {
        let fewer_unplaced = fitness(0, 5, 0.4);
        let fewer_sheets = fitness(1, 1, 0.0);
        assert!(fewer_unplaced.is_better_than(&fewer_sheets));
        assert!(fewer_unplaced.value() < fewer_sheets.value());
    }

    #[test]
    fn test_sheets_dominate_waste() {
        let one_sheet = fitness(0, 1, 0.49);
        let two_sheets = fitness(0, 2, 0.0);
        assert!(one_sheet.is_better_than(&two_sheets));
        assert!(one_sheet.value() < two_sheets.value());
    }

    #[test]
    fn test_waste_breaks_ties() {
        let tight = fitness(0, 1, 0.1);
        let loose = fitness(0, 1, 0.3);
        assert!(tight < loose);
        assert_eq!(tight.compare(&tight), Ordering::Equal);
    }

    #[test]
    fn test_placed_count() {
        let result = PlacementResult {
            fitness: fitness(0, 2, 0.0),
            sheets: vec![
                vec![PartPlacement::new(0, 0.0, 0.0, 0.0), PartPlacement::new(1, 5.0, 0.0, 90.0)],
                vec![PartPlacement::new(2, 0.0, 0.0, 0.0)],
            ],
            unplaced: Vec::new(),
        };
        assert_eq!(result.placed_count(), 3);
        let sheet_of_two: Vec<usize> = result
            .placements()
            .filter(|(_, p)| p.id == 2)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(sheet_of_two, vec![1]);
    }
}
