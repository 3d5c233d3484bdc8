//! The board: a fixed 12×12 grid of cells.
//!
//! Cells are created once and never destroyed. Their occupant and residual
//! marker change throughout play; the base flag is fixed at construction
//! from the four [`BASE_POINTS`].
//!
//! Out-of-range access never panics: lookups return `None` and writes
//! return `false`. Callers bounds-check before mutating.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::EntityId;

/// Board width in cells.
pub const BOARD_WIDTH: i32 = 12;

/// Board height in cells.
pub const BOARD_HEIGHT: i32 = 12;

/// The four cells permanently covered by the base.
pub const BASE_POINTS: [GridPoint; 4] = [
    GridPoint::new(5, 5),
    GridPoint::new(5, 6),
    GridPoint::new(6, 5),
    GridPoint::new(6, 6),
];

/// Lowest coordinate of the deployment square around the base.
pub const DEPLOYMENT_MIN: i32 = 4;

/// Highest coordinate of the deployment square around the base.
pub const DEPLOYMENT_MAX: i32 = 7;

/// Orthogonal neighbor offsets in the fixed visiting order used by every
/// breadth-first search on the board: up, right, down, left.
pub const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance (|x1-x2| + |y1-y2|).
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance (max of the axis deltas).
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Point shifted by an offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbors in [`DIRECTIONS`] order.
    ///
    /// Neighbors may be out of bounds; filter with [`Board::in_bounds`].
    pub fn neighbors(self) -> impl Iterator<Item = GridPoint> {
        DIRECTIONS.into_iter().map(move |(dx, dy)| self.offset(dx, dy))
    }
}

/// Whether a point lies in the square around the base where heroes may be
/// deployed. Base cells are inside the square; callers exclude them.
#[must_use]
pub fn in_deployment_zone(p: GridPoint) -> bool {
    (DEPLOYMENT_MIN..=DEPLOYMENT_MAX).contains(&p.x) && (DEPLOYMENT_MIN..=DEPLOYMENT_MAX).contains(&p.y)
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single board cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Position of this cell.
    pub pos: GridPoint,
    /// Entity standing here, if any.
    pub occupant: Option<EntityId>,
    /// Whether this cell is part of the base footprint.
    pub is_base: bool,
    /// Turns left on the residual marker (0 = no marker).
    pub residual_turns: u32,
}

/// Fixed-size board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Cell data stored in row-major order.
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty 12×12 board with the base footprint flagged.
    #[must_use]
    pub fn new() -> Self {
        let mut cells = Vec::with_capacity((BOARD_WIDTH * BOARD_HEIGHT) as usize);
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                let pos = GridPoint::new(x, y);
                cells.push(Cell {
                    pos,
                    occupant: None,
                    is_base: BASE_POINTS.contains(&pos),
                    residual_turns: 0,
                });
            }
        }
        Self { cells }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        BOARD_WIDTH
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        BOARD_HEIGHT
    }

    /// Convert a point to a row-major index.
    #[inline]
    fn index(p: GridPoint) -> usize {
        (p.y as usize) * (BOARD_WIDTH as usize) + (p.x as usize)
    }

    /// Check if a point lies on the board.
    #[must_use]
    pub fn in_bounds(&self, p: GridPoint) -> bool {
        p.x >= 0 && p.x < BOARD_WIDTH && p.y >= 0 && p.y < BOARD_HEIGHT
    }

    /// Manhattan distance between two points.
    #[must_use]
    pub fn manhattan(&self, a: GridPoint, b: GridPoint) -> u32 {
        a.manhattan(b)
    }

    /// Cell at a point, `None` when out of bounds.
    #[must_use]
    pub fn cell(&self, p: GridPoint) -> Option<&Cell> {
        if self.in_bounds(p) {
            Some(&self.cells[Self::index(p)])
        } else {
            None
        }
    }

    fn cell_mut(&mut self, p: GridPoint) -> Option<&mut Cell> {
        if self.in_bounds(p) {
            Some(&mut self.cells[Self::index(p)])
        } else {
            None
        }
    }

    /// Occupant at a point, `None` when empty or out of bounds.
    #[must_use]
    pub fn occupant(&self, p: GridPoint) -> Option<EntityId> {
        self.cell(p).and_then(|c| c.occupant)
    }

    /// Whether a cell holds an occupant.
    #[must_use]
    pub fn is_occupied(&self, p: GridPoint) -> bool {
        self.occupant(p).is_some()
    }

    /// Set or clear the occupant of a cell.
    /// Returns `false` if out of bounds.
    pub fn set_occupant(&mut self, p: GridPoint, occupant: Option<EntityId>) -> bool {
        match self.cell_mut(p) {
            Some(cell) => {
                cell.occupant = occupant;
                true
            }
            None => false,
        }
    }

    /// Whether a point is part of the base footprint.
    #[must_use]
    pub fn is_base(&self, p: GridPoint) -> bool {
        self.cell(p).is_some_and(|c| c.is_base)
    }

    /// The base footprint.
    #[must_use]
    pub const fn base_points(&self) -> &'static [GridPoint; 4] {
        &BASE_POINTS
    }

    /// Turns left on a cell's residual marker (0 when none or out of bounds).
    #[must_use]
    pub fn residual(&self, p: GridPoint) -> u32 {
        self.cell(p).map_or(0, |c| c.residual_turns)
    }

    /// Set a cell's residual marker.
    /// Returns `false` if out of bounds.
    pub fn set_residual(&mut self, p: GridPoint, turns: u32) -> bool {
        match self.cell_mut(p) {
            Some(cell) => {
                cell.residual_turns = turns;
                true
            }
            None => false,
        }
    }

    /// Decrement every positive residual marker by one.
    pub fn decay_residuals(&mut self) {
        for cell in &mut self.cells {
            cell.residual_turns = cell.residual_turns.saturating_sub(1);
        }
    }

    /// Iterate all cells in row-major order (y outer, x inner).
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// In-bounds orthogonal neighbors of a point, in [`DIRECTIONS`] order.
    pub fn neighbors(&self, p: GridPoint) -> impl Iterator<Item = GridPoint> + '_ {
        p.neighbors().filter(move |n| self.in_bounds(*n))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_flags() {
        let board = Board::new();
        let base_cells: Vec<_> = board.cells().filter(|c| c.is_base).map(|c| c.pos).collect();
        assert_eq!(base_cells.len(), 4);
        for p in BASE_POINTS {
            assert!(board.is_base(p));
        }
        assert!(!board.is_base(GridPoint::new(4, 5)));
    }

    #[test]
    fn test_out_of_bounds_is_safe() {
        let mut board = Board::new();
        let outside = GridPoint::new(-1, 3);
        assert!(board.cell(outside).is_none());
        assert_eq!(board.occupant(outside), None);
        assert!(!board.set_occupant(outside, Some(1)));
        assert!(!board.set_residual(GridPoint::new(12, 0), 1));
        assert_eq!(board.residual(GridPoint::new(0, 12)), 0);
    }

    #[test]
    fn test_occupant_roundtrip() {
        let mut board = Board::new();
        let p = GridPoint::new(3, 4);
        assert!(board.set_occupant(p, Some(7)));
        assert_eq!(board.occupant(p), Some(7));
        assert!(board.set_occupant(p, None));
        assert!(!board.is_occupied(p));
    }

    #[test]
    fn test_distances() {
        let a = GridPoint::new(1, 1);
        let b = GridPoint::new(4, 3);
        assert_eq!(a.manhattan(b), 5);
        assert_eq!(a.chebyshev(b), 3);
    }

    #[test]
    fn test_residual_decay() {
        let mut board = Board::new();
        let p = GridPoint::new(2, 2);
        board.set_residual(p, 1);
        board.decay_residuals();
        assert_eq!(board.residual(p), 0);
        board.decay_residuals();
        assert_eq!(board.residual(p), 0);
    }

    #[test]
    fn test_row_major_iteration() {
        let board = Board::new();
        let first: Vec<_> = board.cells().take(2).map(|c| c.pos).collect();
        assert_eq!(first, vec![GridPoint::new(0, 0), GridPoint::new(1, 0)]);
    }

    #[test]
    fn test_deployment_zone() {
        assert!(in_deployment_zone(GridPoint::new(4, 4)));
        assert!(in_deployment_zone(GridPoint::new(7, 7)));
        assert!(!in_deployment_zone(GridPoint::new(3, 5)));
        assert!(!in_deployment_zone(GridPoint::new(5, 8)));
    }

    #[test]
    fn test_corner_neighbors() {
        let board = Board::new();
        let n: Vec<_> = board.neighbors(GridPoint::new(0, 0)).collect();
        assert_eq!(n, vec![GridPoint::new(0, 1), GridPoint::new(1, 0)]);
    }
}
