//! **dungen-core** — shared types for the *dungen* procedural dungeon
//! toolkit.
//!
//! This crate provides the foundational pieces used by the generation and
//! visibility crates: geometry primitives, the integer-cell grid, and the
//! [`Layout`] conversion between cell space and the expanded (wall-aware)
//! grid.

pub mod geom;
pub mod grid;
pub mod layout;

pub use geom::{CARDINALS, Point, Range};
pub use grid::{Cell, Grid, OPEN, WALL};
pub use layout::Layout;
