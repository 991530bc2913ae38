//! The cell-space ↔ expanded-space conversion.
//!
//! Levels live in two coordinate spaces at once: a coarse *cell* grid where
//! one unit is one logical maze/room cell, and an *expanded* grid where each
//! cell occupies a `maze_width × maze_width` block separated by
//! `wall_width`-thick walls. All conversions between the two spaces go
//! through [`Layout`] so the correspondence cannot drift.

use crate::geom::{Point, Range};

/// Wall and corridor thickness of the expanded grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    /// Thickness of walls between cells, in expanded units.
    pub wall_width: i32,
    /// Side length of a cell's open block, in expanded units.
    pub maze_width: i32,
}

impl Layout {
    /// Create a new layout.
    pub const fn new(wall_width: i32, maze_width: i32) -> Self {
        Self {
            wall_width,
            maze_width,
        }
    }

    /// Distance between the origins of two adjacent cell blocks.
    #[inline]
    pub const fn pitch(self) -> i32 {
        self.wall_width + self.maze_width
    }

    /// Expanded side length for a row or column of `cells` cells:
    /// `wall_width + cells * (wall_width + maze_width)`.
    #[inline]
    pub const fn expanded_size(self, cells: i32) -> i32 {
        self.wall_width + cells * self.pitch()
    }

    /// Expanded-grid origin (top-left) of the block for cell `p`.
    #[inline]
    pub const fn cell_origin(self, p: Point) -> Point {
        Point::new(
            self.wall_width + p.x * self.pitch(),
            self.wall_width + p.y * self.pitch(),
        )
    }

    /// Expanded-grid block occupied by cell `p`, as a half-open range.
    #[inline]
    pub fn cell_block(self, p: Point) -> Range {
        let o = self.cell_origin(p);
        Range::new(o.x, o.y, o.x + self.maze_width, o.y + self.maze_width)
    }
}
