//! Recursive shadow-casting field of view with distance-based lighting and
//! a fog-of-war memory.
//!
//! The light map mirrors a level grid one node per tile. Each [`update`]
//! recomputes visibility from the viewer position: tiles in line of sight
//! get an alpha proportional to their distance, tiles at the edge of the
//! radius fade into fog, and anything ever seen stays dimly remembered when
//! it falls out of sight.
//!
//! [`update`]: FieldOfView::update

use dungen_core::{Grid, Point, WALL};

/// Alpha assigned to remembered-but-currently-unseen tiles. Distance alphas
/// at or beyond this value collapse into the fog band instead of marking
/// the tile as seen.
pub const FOG_ALPHA: f64 = 0.8;

/// Octant transforms for the shadow caster. Each row maps the scan-space
/// deltas `(dx, dy)` into one of the eight octants around the viewer.
const OCTANTS: [[i32; 4]; 8] = [
    [1, 0, 0, 1],
    [0, 1, 1, 0],
    [0, -1, 1, 0],
    [-1, 0, 0, 1],
    [-1, 0, 0, -1],
    [0, -1, -1, 0],
    [0, 1, -1, 0],
    [1, 0, 0, -1],
];

/// How the light map treats visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViewMode {
    /// Shadow casting with fog of war; tiles must be discovered.
    #[default]
    FogOfWar,
    /// The whole level is lit; [`FieldOfView::update`] is a no-op.
    AllVisible,
}

/// Lighting state for one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightNode {
    /// Darkness in `0.0 ..= 1.0`; 0 is fully lit, 1 is unexplored black.
    pub alpha: f64,
    /// Whether the underlying tile blocks sight.
    pub wall: bool,
    /// Whether the tile has ever been inside the lit radius.
    pub seen: bool,
}

/// A per-tile light map over a level grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldOfView {
    mode: ViewMode,
    width: i32,
    height: i32,
    nodes: Vec<LightNode>,
}

impl FieldOfView {
    /// Create an empty light map; call [`create_fov`](Self::create_fov)
    /// before updating.
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            width: 0,
            height: 0,
            nodes: Vec::new(),
        }
    }

    /// The view mode this map was created with.
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Build the light map for a level grid, resetting all fog memory.
    /// Walls are tiles equal to [`WALL`]; in [`ViewMode::AllVisible`] every
    /// open tile starts fully lit.
    pub fn create_fov(&mut self, grid: &Grid) {
        self.width = grid.width();
        self.height = grid.height();
        self.nodes = grid
            .iter()
            .map(|(_, cell)| {
                let wall = cell == WALL;
                let alpha = match self.mode {
                    ViewMode::FogOfWar => 1.0,
                    ViewMode::AllVisible => {
                        if wall {
                            1.0
                        } else {
                            0.0
                        }
                    }
                };
                LightNode {
                    alpha,
                    wall,
                    seen: false,
                }
            })
            .collect();
    }

    /// Refresh wall flags from a changed grid, keeping alphas and fog
    /// memory. Ignored if the dimensions differ; rebuild with
    /// [`create_fov`](Self::create_fov) instead.
    pub fn update_fov(&mut self, grid: &Grid) {
        if grid.width() != self.width || grid.height() != self.height {
            return;
        }
        for (i, (_, cell)) in grid.iter().enumerate() {
            let wall = cell == WALL;
            self.nodes[i].wall = wall;
            if self.mode == ViewMode::AllVisible {
                self.nodes[i].alpha = if wall { 1.0 } else { 0.0 };
            }
        }
    }

    /// Recompute visibility from `viewer` out to `range` tiles.
    ///
    /// All alphas first collapse to fog (or full dark when never seen),
    /// then the eight octants are scanned. Does nothing in
    /// [`ViewMode::AllVisible`].
    pub fn update(&mut self, viewer: Point, range: i32) {
        if self.mode == ViewMode::AllVisible {
            return;
        }
        for node in &mut self.nodes {
            node.alpha = if node.seen { FOG_ALPHA } else { 1.0 };
        }
        for octant in OCTANTS {
            self.cast_light(1, 1.0, 0.0, octant, viewer, range);
        }
        if let Some(i) = self.index(viewer) {
            self.nodes[i].alpha = 0.0;
        }
    }

    /// The light node for a tile, if in bounds.
    pub fn at(&self, p: Point) -> Option<&LightNode> {
        self.index(p).map(|i| &self.nodes[i])
    }

    /// Iterate over all nodes with their positions, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &LightNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| {
            let i = i as i32;
            (Point::new(i % self.width, i / self.width), node)
        })
    }

    fn index(&self, p: Point) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return None;
        }
        Some((p.y * self.width + p.x) as usize)
    }

    /// Scan one octant between the `start` and `end` slopes. Rows march
    /// outward from the viewer; a wall splits the visible interval and
    /// recursion continues behind the near edge.
    fn cast_light(
        &mut self,
        row: i32,
        mut start: f64,
        end: f64,
        octant: [i32; 4],
        viewer: Point,
        range: i32,
    ) {
        if start < end {
            return;
        }
        let [xx, xy, yx, yy] = octant;
        let mut new_start = 0.0;
        let mut blocked = false;

        for distance in row..=range {
            let dy = -distance;
            for dx in -distance..=0 {
                let left_slope = (dx as f64 - 0.5) / (dy as f64 + 0.5);
                let right_slope = (dx as f64 + 0.5) / (dy as f64 - 0.5);
                if start < right_slope {
                    continue;
                }
                if end > left_slope {
                    break;
                }

                let current = Point::new(
                    viewer.x + dx * xx + dy * xy,
                    viewer.y + dx * yx + dy * yy,
                );
                // Out-of-bounds tiles block sight like walls.
                let wall = self.at(current).map(|n| n.wall).unwrap_or(true);

                if blocked {
                    if wall {
                        new_start = right_slope;
                        continue;
                    }
                    blocked = false;
                    start = new_start;
                } else if wall && distance < range {
                    blocked = true;
                    self.cast_light(distance + 1, start, left_slope, octant, viewer, range);
                    new_start = right_slope;
                }

                let abs_distance = f64::from(dx * dx + dy * dy).sqrt();
                if !blocked && abs_distance <= f64::from(range) {
                    if let Some(i) = self.index(current) {
                        let mut alpha = abs_distance / f64::from(range);
                        if alpha >= FOG_ALPHA {
                            // The rim of the radius fades into fog without
                            // counting as discovered.
                            alpha = if self.nodes[i].seen { FOG_ALPHA } else { 1.0 };
                        } else {
                            self.nodes[i].seen = true;
                        }
                        self.nodes[i].alpha = alpha;
                    }
                }
            }
            if blocked {
                break;
            }
        }
    }
}
