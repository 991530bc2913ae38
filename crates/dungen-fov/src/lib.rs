//! **dungen-fov** — visibility for the *dungen* procedural dungeon toolkit.
//!
//! Recursive shadow casting over a level grid, with distance-based light
//! falloff and fog-of-war memory: tiles the viewer has seen stay dimly
//! visible after they leave the lit radius. [`RangeControl`] rate-limits
//! interactive changes to the view radius.
//!
//! ```no_run
//! use dungen_core::{Grid, Point};
//! use dungen_fov::{FieldOfView, ViewMode};
//!
//! let level: Grid = todo!("generate with dungen-level");
//! let mut fov = FieldOfView::new(ViewMode::FogOfWar);
//! fov.create_fov(&level);
//! fov.update(Point::new(4, 4), 12);
//! ```

pub mod fov;
pub mod range;

pub use fov::{FOG_ALPHA, FieldOfView, LightNode, ViewMode};
pub use range::{COMMIT_INTERVAL, MAX_RANGE, MIN_RANGE, RangeControl};
