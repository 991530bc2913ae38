//! An integer-cell grid for map representation.
//!
//! [`Cell`] is a newtype over `i32`; the generation pipeline only ever uses
//! the values [`OPEN`] (0) and [`WALL`] (1). Storage is an owned `Vec` so
//! grids can be cloned as snapshots and sent across thread boundaries.

use crate::geom::{Point, Range};

/// A map cell value, wrapping an `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell(pub i32);

/// An open (walkable) cell.
pub const OPEN: Cell = Cell(0);

/// A wall cell.
pub const WALL: Cell = Cell(1);

impl Cell {
    /// Create a new cell with the given value.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the underlying integer value.
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

impl From<Cell> for i32 {
    fn from(c: Cell) -> Self {
        c.0
    }
}

/// A 2D grid of [`Cell`] values with owned backing storage.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a new grid filled with [`OPEN`].
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width * height) as usize],
        }
    }

    /// Returns the bounding range of this grid.
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    /// Returns the size as a Point (width = x, height = y).
    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }

    /// Width of the grid.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height of the grid.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether the grid contains the given point.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    #[inline]
    fn index(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize
    }

    /// Get the cell at a point, or `None` if out of bounds.
    pub fn at(&self, p: Point) -> Option<Cell> {
        if !self.contains(p) {
            return None;
        }
        Some(self.cells[self.index(p)])
    }

    /// Set the cell at a point. Does nothing if out of bounds.
    pub fn set(&mut self, p: Point, cell: Cell) {
        if !self.contains(p) {
            return;
        }
        let idx = self.index(p);
        self.cells[idx] = cell;
    }

    /// Fill the entire grid with the given cell.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Fill a rectangular region with the given cell. Points outside the
    /// grid are skipped.
    pub fn fill_range(&mut self, rng: Range, cell: Cell) {
        for p in rng.iter() {
            self.set(p, cell);
        }
    }

    /// Count how many cells equal the given cell.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Iterate over `(Point, Cell)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, Cell)> + '_ {
        self.bounds().iter().map(|p| (p, self.cells[self.index(p)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_size() {
        let g = Grid::new(10, 5);
        assert_eq!(g.size(), Point::new(10, 5));
        assert_eq!(g.width(), 10);
        assert_eq!(g.height(), 5);
        assert_eq!(g.count(OPEN), 50);
    }

    #[test]
    fn test_set_and_at() {
        let mut g = Grid::new(4, 4);
        let p = Point::new(2, 3);
        g.set(p, WALL);
        assert_eq!(g.at(p), Some(WALL));
        assert_eq!(g.at(Point::new(0, 0)), Some(OPEN));
        assert_eq!(g.at(Point::new(10, 10)), None);
    }

    #[test]
    fn test_fill_range_clips() {
        let mut g = Grid::new(4, 4);
        g.fill(WALL);
        g.fill_range(Range::new(2, 2, 6, 6), OPEN);
        assert_eq!(g.count(OPEN), 4);
        assert_eq!(g.at(Point::new(3, 3)), Some(OPEN));
        assert_eq!(g.at(Point::new(1, 1)), Some(WALL));
    }

    #[test]
    fn test_clone_is_snapshot() {
        let mut g = Grid::new(3, 3);
        let snap = g.clone();
        g.set(Point::new(1, 1), WALL);
        assert_eq!(snap.at(Point::new(1, 1)), Some(OPEN));
        assert_ne!(g, snap);
    }
}
