//! The level generation pipeline.
//!
//! [`Generator`] owns two grids at once: the coarse cell grid and the
//! expanded grid with wall thickness. Every carve goes through the draw
//! helpers at the bottom of this file, which write both grids through the
//! shared [`Layout`] conversion, so the two views can never disagree.
//!
//! Generation is a fixed sequence of passes, each running to completion
//! before the next starts: room placement, maze carving, door opening,
//! dead-end retraction, slack reduction, maze-wall relaxation, excess-wall
//! removal, and artifact cleanup. A caller-supplied frame callback receives
//! the expanded grid after every pass (and after every write when
//! animating); it is for visualization only and never feeds back into
//! generation.

use std::thread;
use std::time::Duration;

use dungen_core::{CARDINALS, Cell, Grid, Layout, OPEN, Point, Range, WALL};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, RngExt, SeedableRng};

use crate::config::{ConfigError, GenParams};

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// An accepted room, as a half-open rectangle in cell space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub x_border: i32,
    pub y_border: i32,
}

impl Room {
    /// Whether the room contains the given cell.
    pub fn contains(&self, p: Point) -> bool {
        self.x <= p.x && self.y <= p.y && self.x_border > p.x && self.y_border > p.y
    }

    /// Whether two rooms intersect or share a boundary (including a single
    /// corner). Touching rooms are rejected during placement so that a
    /// corridor always fits between any two rooms.
    pub fn overlaps_or_touches(&self, other: &Room) -> bool {
        self.x <= other.x_border
            && self.x_border >= other.x
            && self.y <= other.y_border
            && self.y_border >= other.y
    }
}

// ---------------------------------------------------------------------------
// Frame emission
// ---------------------------------------------------------------------------

/// Routes grid snapshots to the caller's callback.
struct FrameSink<'a> {
    on_frame: &'a mut dyn FnMut(&Grid),
    animate: bool,
    delay: Duration,
}

impl FrameSink<'_> {
    /// Emit a snapshot for a single write; only when animating.
    fn step(&mut self, grid: &Grid) {
        if self.animate {
            (self.on_frame)(grid);
            thread::sleep(self.delay);
        }
    }

    /// Emit a snapshot unconditionally (pass boundaries and the final frame).
    fn frame(&mut self, grid: &Grid) {
        (self.on_frame)(grid);
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Fold a seed string into a 64-bit value (FNV-1a).
fn seed_hash(s: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

/// The level generator.
///
/// Construct with [`Generator::new`] (seeded [`StdRng`]) or
/// [`Generator::with_rng`] for an arbitrary RNG, then call
/// [`generate`](Self::generate) once. The grids and room list are available
/// through the accessors afterwards.
pub struct Generator<R: Rng> {
    params: GenParams,
    layout: Layout,
    rng: R,
    /// Cell-space grid: one entry per logical cell.
    cells: Grid,
    /// Expanded grid: cell blocks separated by wall gaps.
    expanded: Grid,
    rooms: Vec<Room>,
}

impl Generator<StdRng> {
    /// Create a generator from validated parameters, seeding the RNG from
    /// `params.seed` (or from entropy when absent).
    pub fn new(params: GenParams) -> Result<Self, ConfigError> {
        let rng = match &params.seed {
            Some(s) => StdRng::seed_from_u64(seed_hash(s)),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self::with_rng(params, rng)
    }
}

impl<R: Rng> Generator<R> {
    /// Create a generator with a caller-supplied RNG.
    pub fn with_rng(params: GenParams, rng: R) -> Result<Self, ConfigError> {
        params.validate()?;
        let layout = Layout::new(params.wall_width, params.maze_width);
        let mut cells = Grid::new(params.width, params.height);
        cells.fill(WALL);
        let mut expanded = Grid::new(
            layout.expanded_size(params.width),
            layout.expanded_size(params.height),
        );
        expanded.fill(WALL);
        Ok(Self {
            params,
            layout,
            rng,
            cells,
            expanded,
            rooms: Vec::new(),
        })
    }

    /// The parameters this generator was created with.
    pub fn params(&self) -> &GenParams {
        &self.params
    }

    /// The wall/corridor layout of the expanded grid.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// The accepted rooms, in acceptance order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// The cell-space grid.
    pub fn cells(&self) -> &Grid {
        &self.cells
    }

    /// The expanded grid.
    pub fn expanded(&self) -> &Grid {
        &self.expanded
    }

    /// Run the full pipeline. `on_frame` receives the expanded grid after
    /// every pass, after every write when `animate` is set, and once more
    /// when generation finishes.
    pub fn generate(&mut self, mut on_frame: impl FnMut(&Grid)) {
        let mut sink = FrameSink {
            on_frame: &mut on_frame,
            animate: self.params.animate,
            delay: Duration::from_millis(self.params.animation_delay),
        };

        debug!("adding rooms");
        self.add_rooms(&mut sink);
        sink.frame(&self.expanded);

        debug!("creating maze");
        self.create_maze(Point::ZERO, &mut sink);
        sink.frame(&self.expanded);

        debug!("opening rooms");
        self.open_rooms();
        sink.frame(&self.expanded);

        debug!("removing dead ends");
        self.remove_dead_ends(&mut sink);
        sink.frame(&self.expanded);

        debug!("reducing slack");
        self.reduce_slack(&mut sink);
        sink.frame(&self.expanded);

        debug!("removing maze walls");
        self.remove_maze_walls(&mut sink);
        sink.frame(&self.expanded);

        debug!("removing excess walls");
        self.remove_excess_wall(&mut sink);
        sink.frame(&self.expanded);

        debug!("removing artifacts");
        self.remove_artifacts(&mut sink);
        sink.frame(&self.expanded);

        sink.frame(&self.expanded);
        debug!("generation complete");
    }

    /// Uniform draw over an inclusive range, matching the convention used
    /// throughout the pipeline.
    fn roll(&mut self, min: i32, max: i32) -> i32 {
        self.rng.random_range(min..=max)
    }

    // ── Pass 2: room placement ─────────────────────────────────────

    fn add_rooms(&mut self, sink: &mut FrameSink) {
        for _ in 0..self.params.room_attempts {
            let room_width = self.roll(self.params.min_size, self.params.max_size);
            let room_height = self.roll(self.params.min_size, self.params.max_size);
            let x = self.roll(1, self.params.width - room_width - 1);
            let y = self.roll(1, self.params.height - room_height - 1);
            let candidate = Room {
                x,
                y,
                x_border: x + room_width,
                y_border: y + room_height,
            };
            if self.rooms.iter().any(|r| r.overlaps_or_touches(&candidate)) {
                continue;
            }
            self.rooms.push(candidate);
            self.draw_room(candidate, sink);
        }
    }

    fn draw_room(&mut self, room: Room, sink: &mut FrameSink) {
        // The open region covers the room's cell blocks and the wall gaps
        // between them, but not the surrounding border.
        let origin = self.layout.cell_origin(Point::new(room.x, room.y));
        let end = Point::new(
            room.x_border * self.layout.pitch(),
            room.y_border * self.layout.pitch(),
        );
        for ix in origin.x..end.x {
            for iy in origin.y..end.y {
                self.expanded.set(Point::new(ix, iy), OPEN);
            }
            sink.step(&self.expanded);
        }
        for ix in room.x..room.x_border {
            for iy in room.y..room.y_border {
                self.cells.set(Point::new(ix, iy), OPEN);
            }
        }
    }

    // ── Pass 3: maze carving ───────────────────────────────────────

    /// Iterative recursive-backtracking maze carver with an explicit stack.
    fn create_maze(&mut self, start: Point, sink: &mut FrameSink) {
        let mut stack = vec![start];
        let mut last_dir: Option<Point> = None;

        self.draw_cell(start, OPEN);

        while let Some(&cell) = stack.last() {
            let dirs = self.directions_with(cell, WALL);
            if dirs.is_empty() {
                // Branch exhausted; backtrack.
                last_dir = None;
                stack.pop();
                continue;
            }
            let dir = match last_dir {
                Some(d) if dirs.contains(&d) && self.roll(0, 100) > self.params.windyness => d,
                _ => {
                    let idx = self.roll(0, dirs.len() as i32 - 1) as usize;
                    dirs[idx]
                }
            };
            self.draw_cell_to(cell, dir, OPEN);
            sink.step(&self.expanded);
            stack.push(cell + dir);
            last_dir = Some(dir);
        }
    }

    // ── Pass 4: door opening ───────────────────────────────────────

    fn open_rooms(&mut self) {
        let rooms = self.rooms.clone();
        let max_doors = self.params.max_doors.min(4);
        for room in rooms {
            let num_doors = self.roll(self.params.min_doors, max_doors);
            let mut sides: Vec<usize> = Vec::new();
            while sides.len() < num_doors as usize {
                let side = self.roll(0, 3) as usize;
                if !sides.contains(&side) {
                    sides.push(side);
                }
            }
            for side in sides {
                let dir = CARDINALS[side];
                let x = match dir.x {
                    1 => room.x_border - 1,
                    -1 => room.x,
                    _ => self.roll(room.x + 1, room.x_border - 2),
                };
                let y = match dir.y {
                    1 => room.y_border - 1,
                    -1 => room.y,
                    _ => self.roll(room.y + 1, room.y_border - 2),
                };
                // Doors only pierce the expanded grid; the cell grid keeps
                // seeing the room and the corridor as distinct cells.
                self.draw_wall_to(Point::new(x, y), dir, OPEN);
            }
        }
    }

    // ── Pass 5: dead-end retraction ────────────────────────────────

    fn remove_dead_ends(&mut self, sink: &mut FrameSink) {
        let mut found = true;
        while found {
            found = false;
            for x in 0..self.params.width {
                for y in 0..self.params.height {
                    let cell = Point::new(x, y);
                    if self.cells.at(cell) != Some(OPEN) {
                        continue;
                    }
                    let openings = self.cell_walls(cell, OPEN);
                    if openings.len() == 1 {
                        // Fill the dead end and its single gap back in.
                        // This can turn the neighbor into a new dead end,
                        // hence the fixpoint loop.
                        self.draw_cell_from(cell, openings[0], WALL);
                        sink.step(&self.expanded);
                        found = true;
                    }
                }
            }
        }
    }

    // ── Pass 6: slack reduction ────────────────────────────────────

    /// Straighten zig-zags: find a corner, walk its corridor through
    /// straight and aligned-crossing cells to a mirroring corner, and if
    /// the parallel row one cell over in the turn direction is free,
    /// reroute the corridor through it.
    fn reduce_slack(&mut self, sink: &mut FrameSink) {
        let mut slack_left = true;
        while slack_left {
            slack_left = false;
            for x in 0..self.params.width {
                for y in 0..self.params.height {
                    let start = Point::new(x, y);
                    if self.cells.at(start) != Some(OPEN) {
                        continue;
                    }
                    let openings = self.cell_walls(start, OPEN);
                    if openings.len() != 2 || openings[0].x.abs() == openings[1].x.abs() {
                        continue;
                    }

                    // `start` is a corner. Walk along one of its openings;
                    // the other is the turn direction.
                    let mut walk = 0usize;
                    let mut turn = 1usize;
                    let mut offset = 1;
                    let mut run: Vec<Point> = Vec::new();
                    let mut crossings: Vec<Point> = Vec::new();
                    let mut end: Option<Point> = None;
                    let mut first_attempt = true;
                    let mut valid = false;
                    let mut walking = true;

                    while walking {
                        let next = start + openings[walk] * offset;
                        let next_openings = self.cell_walls(next, OPEN);
                        match next_openings.len() {
                            2 => {
                                if next_openings[0].x.abs() == next_openings[1].x.abs() {
                                    // Straight corridor cell; keep walking.
                                    offset += 1;
                                    run.push(next);
                                } else {
                                    // A corner ends the walk. It only
                                    // closes a slack if it turns the same
                                    // way as the start corner.
                                    if (next_openings[1].x == openings[turn].x
                                        || next_openings[0].x == openings[turn].x)
                                        && (next_openings[1].y == openings[turn].y
                                            || next_openings[0].y == openings[turn].y)
                                    {
                                        end = Some(next);
                                    }
                                    walking = false;
                                }
                            }
                            3 => {
                                // A T-junction is traversable when its arms
                                // are the walk axis plus the turn direction.
                                let aligned = next_openings.iter().all(|&o| {
                                    o == openings[turn]
                                        || o == openings[walk]
                                        || o == openings[walk] * -1
                                });
                                if aligned {
                                    offset += 1;
                                    crossings.push(next);
                                } else {
                                    walking = false;
                                }
                            }
                            _ => walking = false,
                        }

                        if !walking {
                            let mut obstructed = false;
                            if end.is_some() {
                                if !run.is_empty() {
                                    for &c in &run {
                                        if self.cells.at(c + openings[turn]) == Some(OPEN) {
                                            obstructed = true;
                                            break;
                                        }
                                    }
                                } else {
                                    // Adjacent corners: the rerouted path
                                    // would run through the single diagonal
                                    // cell, which must not already connect
                                    // in the walk direction.
                                    let inside = start + openings[turn];
                                    let inside_walls = self.cell_walls(inside, WALL);
                                    obstructed = !inside_walls.contains(&openings[walk]);
                                }
                                if !obstructed {
                                    valid = true;
                                }
                            }

                            if (end.is_none() || obstructed) && first_attempt {
                                // Retry once with the other opening as the
                                // walk direction.
                                walking = true;
                                first_attempt = false;
                                offset = 1;
                                run.clear();
                                crossings.clear();
                                end = None;
                                walk = 1;
                                turn = 0;
                            }
                        }
                    }

                    if !valid {
                        continue;
                    }
                    let Some(end) = end else {
                        continue;
                    };
                    let walk_dir = openings[walk];
                    let turn_dir = openings[turn];
                    slack_left = true;

                    // Close the old path: both corners, the gap chain along
                    // the walk, and any crossing cells (their branch toward
                    // the new row keeps them connected).
                    self.draw_cell_from(start, turn_dir, WALL);
                    sink.step(&self.expanded);
                    self.draw_cell_from(end, turn_dir, WALL);
                    sink.step(&self.expanded);
                    self.draw_wall_to(start, walk_dir, WALL);
                    sink.step(&self.expanded);
                    for &c in &run {
                        self.draw_cell_from(c, walk_dir, WALL);
                        sink.step(&self.expanded);
                    }
                    for &c in &crossings {
                        self.draw_wall_to(c, turn_dir, WALL);
                        sink.step(&self.expanded);
                        self.draw_cell_from(c, walk_dir, WALL);
                        sink.step(&self.expanded);
                    }

                    // Open the straightened path one row over in the turn
                    // direction.
                    let new_start = start + turn_dir;
                    self.draw_wall_to(new_start, walk_dir, OPEN);
                    sink.step(&self.expanded);
                    for &c in &run {
                        self.draw_cell_from(c + turn_dir, walk_dir, OPEN);
                        sink.step(&self.expanded);
                    }
                    for &c in &crossings {
                        self.draw_wall_to(c + turn_dir, walk_dir, OPEN);
                        sink.step(&self.expanded);
                    }
                }
            }
        }
    }

    // ── Pass 7: maze-wall relaxation ───────────────────────────────

    fn remove_maze_walls(&mut self, sink: &mut FrameSink) {
        for x in 0..self.params.width {
            for y in 0..self.params.height {
                let cell = Point::new(x, y);
                if self.cells.at(cell) != Some(OPEN) || self.is_in_room(cell) {
                    continue;
                }
                let dirs = self.directions_with(cell, OPEN);
                let walls = self.cell_walls(cell, WALL);
                for dir in dirs.into_iter().filter(|d| walls.contains(d)) {
                    if !self.is_in_room(cell + dir) {
                        self.draw_wall_to(cell, dir, OPEN);
                        sink.step(&self.expanded);
                    }
                }
            }
        }
    }

    // ── Pass 8: excess-wall removal ────────────────────────────────

    fn remove_excess_wall(&mut self, sink: &mut FrameSink) {
        let mut has_excess = true;
        while has_excess {
            has_excess = false;
            for x in 0..self.params.width {
                for y in 0..self.params.height {
                    let cell = Point::new(x, y);
                    if self.cells.at(cell) != Some(WALL) {
                        continue;
                    }
                    let dirs = self.directions_with(cell, OPEN);
                    if dirs.len() < 3 {
                        continue;
                    }
                    // A wall stub between merged corridors: open it and
                    // every adjoining gap that does not border a room.
                    self.draw_cell(cell, OPEN);
                    sink.step(&self.expanded);
                    has_excess = true;
                    for dir in dirs {
                        if !self.is_in_room(cell + dir) {
                            self.draw_wall_to(cell, dir, OPEN);
                            sink.step(&self.expanded);
                        }
                    }
                }
            }
        }
    }

    // ── Pass 9: artifact removal ───────────────────────────────────

    /// Clear isolated wall posts in the expanded grid: wall blocks at the
    /// lattice corners whose four orthogonal neighbors are all open.
    fn remove_artifacts(&mut self, sink: &mut FrameSink) {
        let ww = self.layout.wall_width;
        let pitch = self.layout.pitch();
        let (ew, eh) = (self.expanded.width(), self.expanded.height());

        let mut x = 0;
        while x < ew - ww {
            let mut y = 0;
            while y < eh - ww {
                let inside = x >= 1 && y >= 1 && x + ww < ew && y + ww < eh;
                if inside
                    && self.expanded.at(Point::new(x - 1, y)) == Some(OPEN)
                    && self.expanded.at(Point::new(x, y - 1)) == Some(OPEN)
                    && self.expanded.at(Point::new(x + ww, y)) == Some(OPEN)
                    && self.expanded.at(Point::new(x, y + ww)) == Some(OPEN)
                {
                    self.expanded
                        .fill_range(Range::new(x, y, x + ww, y + ww), OPEN);
                }
                y += pitch;
            }
            sink.step(&self.expanded);
            x += pitch;
        }
    }

    // ── Probes ─────────────────────────────────────────────────────

    /// Whether the cell lies inside any accepted room.
    fn is_in_room(&self, p: Point) -> bool {
        self.rooms.iter().any(|r| r.contains(p))
    }

    /// Cardinal directions whose neighboring *cell-grid* entry equals
    /// `value`, bounds-checked in cell space.
    fn directions_with(&self, cell: Point, value: Cell) -> Vec<Point> {
        CARDINALS
            .iter()
            .copied()
            .filter(|&d| self.cells.at(cell + d) == Some(value))
            .collect()
    }

    /// Cardinal directions whose wall gap in the *expanded* grid equals
    /// `value`, reported in up, left, down, right order. A single probe
    /// pixel per side suffices because gaps are always written whole.
    ///
    /// The report order matters: `reduce_slack` walks `openings[0]` first,
    /// so it decides which of two symmetric slacks gets straightened.
    fn cell_walls(&self, cell: Point, value: Cell) -> Vec<Point> {
        let o = self.layout.cell_origin(cell);
        let mw = self.layout.maze_width;
        let probes = [
            (Point::new(0, -1), Point::new(o.x, o.y - 1)),
            (Point::new(-1, 0), Point::new(o.x - 1, o.y)),
            (Point::new(0, 1), Point::new(o.x, o.y + mw)),
            (Point::new(1, 0), Point::new(o.x + mw, o.y)),
        ];
        probes
            .into_iter()
            .filter(|&(_, probe)| self.expanded.at(probe) == Some(value))
            .map(|(d, _)| d)
            .collect()
    }

    // ── Draw helpers (always write both grids) ─────────────────────

    /// Set a cell's block in the expanded grid and its cell-grid entry.
    fn draw_cell(&mut self, cell: Point, value: Cell) {
        self.expanded.fill_range(self.layout.cell_block(cell), value);
        self.cells.set(cell, value);
    }

    /// Set the wall gap from `cell` toward `dir` in the expanded grid.
    fn draw_wall_to(&mut self, cell: Point, dir: Point, value: Cell) {
        let o = self.layout.cell_origin(cell);
        let ww = self.layout.wall_width;
        let mw = self.layout.maze_width;
        let gx = o.x + match dir.x {
            1 => mw,
            -1 => -ww,
            _ => 0,
        };
        let gy = o.y + match dir.y {
            1 => mw,
            -1 => -ww,
            _ => 0,
        };
        let gap_w = dir.x.abs() * ww + dir.y.abs() * mw;
        let gap_h = dir.y.abs() * ww + dir.x.abs() * mw;
        self.expanded
            .fill_range(Range::new(gx, gy, gx + gap_w, gy + gap_h), value);
    }

    /// Set the gap toward `dir` and the *destination* cell.
    fn draw_cell_to(&mut self, cell: Point, dir: Point, value: Cell) {
        self.draw_wall_to(cell, dir, value);
        self.draw_cell(cell + dir, value);
    }

    /// Set the gap toward `dir` and the *source* cell.
    fn draw_cell_from(&mut self, cell: Point, dir: Point, value: Cell) {
        self.draw_wall_to(cell, dir, value);
        self.draw_cell(cell, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_sink(on_frame: &mut dyn FnMut(&Grid)) -> FrameSink<'_> {
        FrameSink {
            on_frame,
            animate: false,
            delay: Duration::ZERO,
        }
    }

    fn small_params(seed: &str) -> GenParams {
        GenParams {
            width: 10,
            height: 10,
            room_attempts: 5,
            min_size: 3,
            max_size: 4,
            seed: Some(seed.to_string()),
            ..GenParams::default()
        }
    }

    #[test]
    fn test_identical_seeds_produce_identical_levels() {
        let mut a = Generator::new(small_params("test")).unwrap();
        let mut b = Generator::new(small_params("test")).unwrap();
        a.generate(|_| {});
        b.generate(|_| {});
        assert_eq!(a.expanded(), b.expanded());
        assert_eq!(a.cells(), b.cells());
        assert_eq!(a.rooms(), b.rooms());
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = Generator::new(small_params("one")).unwrap();
        let mut b = Generator::new(small_params("two")).unwrap();
        a.generate(|_| {});
        b.generate(|_| {});
        // Astronomically unlikely to collide on a 10x10 level.
        assert_ne!(a.expanded(), b.expanded());
    }

    #[test]
    fn test_rooms_do_not_overlap_or_touch() {
        let params = GenParams {
            seed: Some("rooms".to_string()),
            ..GenParams::default()
        };
        let mut g = Generator::new(params).unwrap();
        g.generate(|_| {});
        assert!(!g.rooms().is_empty());
        for (i, a) in g.rooms().iter().enumerate() {
            for b in &g.rooms()[i + 1..] {
                assert!(!a.overlaps_or_touches(b), "rooms {a:?} and {b:?} touch");
            }
        }
    }

    #[test]
    fn test_grids_stay_consistent() {
        let mut g = Generator::new(small_params("consistency")).unwrap();
        g.generate(|_| {});
        let layout = g.layout();
        for (p, c) in g.cells().iter() {
            let block = layout.cell_block(p);
            let open_in_block = block
                .iter()
                .filter(|&q| g.expanded().at(q) == Some(OPEN))
                .count();
            if c == OPEN {
                assert_eq!(open_in_block, block.iter().count(), "cell {p} out of sync");
            } else {
                assert_eq!(open_in_block, 0, "wall cell {p} has open pixels");
            }
        }
    }

    #[test]
    fn test_maze_reaches_every_cell_without_rooms() {
        let params = GenParams {
            width: 8,
            height: 8,
            room_attempts: 0,
            seed: Some("maze".to_string()),
            ..GenParams::default()
        };
        let mut g = Generator::new(params).unwrap();
        let mut noop = |_: &Grid| {};
        let mut sink = quiet_sink(&mut noop);
        g.create_maze(Point::ZERO, &mut sink);
        assert_eq!(g.cells().count(OPEN), 64);
    }

    #[test]
    fn test_maze_reaches_every_cell_outside_rooms() {
        let mut g = Generator::new(small_params("reach")).unwrap();
        let mut noop = |_: &Grid| {};
        let mut sink = quiet_sink(&mut noop);
        g.add_rooms(&mut sink);
        g.create_maze(Point::ZERO, &mut sink);
        for (p, c) in g.cells().iter() {
            if !g.is_in_room(p) {
                assert_eq!(c, OPEN, "maze missed cell {p}");
            }
        }
    }

    #[test]
    fn test_every_room_gets_a_door() {
        let mut g = Generator::new(small_params("doors")).unwrap();
        let mut noop = |_: &Grid| {};
        let mut sink = quiet_sink(&mut noop);
        g.add_rooms(&mut sink);
        g.create_maze(Point::ZERO, &mut sink);
        g.open_rooms();
        for room in g.rooms().to_vec() {
            let mut doors = 0;
            for p in Range::new(room.x, room.y, room.x_border, room.y_border).iter() {
                for d in CARDINALS {
                    if !room.contains(p + d) && self_gap_open(&g, p, d) {
                        doors += 1;
                    }
                }
            }
            assert!(doors >= 1, "room {room:?} has no door");
        }
    }

    fn self_gap_open(g: &Generator<StdRng>, cell: Point, dir: Point) -> bool {
        g.cell_walls(cell, OPEN).contains(&dir)
    }

    #[test]
    fn test_no_dead_ends_after_retraction() {
        let mut g = Generator::new(small_params("deadends")).unwrap();
        let mut noop = |_: &Grid| {};
        let mut sink = quiet_sink(&mut noop);
        g.add_rooms(&mut sink);
        g.create_maze(Point::ZERO, &mut sink);
        g.open_rooms();
        g.remove_dead_ends(&mut sink);
        for (p, c) in g.cells().iter() {
            if c == OPEN && !g.is_in_room(p) {
                let openings = g.cell_walls(p, OPEN).len();
                assert_ne!(openings, 1, "dead end left at {p}");
            }
        }
    }

    #[test]
    fn test_full_pipeline_leaves_no_dead_ends() {
        let mut g = Generator::new(small_params("pipeline")).unwrap();
        g.generate(|_| {});
        for (p, c) in g.cells().iter() {
            if c == OPEN && !g.is_in_room(p) {
                assert_ne!(g.cell_walls(p, OPEN).len(), 1, "dead end at {p}");
            }
        }
    }

    #[test]
    fn test_frame_emitted_per_pass_and_finally() {
        let mut g = Generator::new(small_params("frames")).unwrap();
        let mut frames = 0;
        let mut last_size = Point::ZERO;
        g.generate(|grid| {
            frames += 1;
            last_size = grid.size();
        });
        // Eight passes plus the unconditional final frame.
        assert_eq!(frames, 9);
        assert_eq!(last_size, Point::new(31, 31));
    }

    /// An empty level for hand-carving corridor shapes.
    fn blank_level(width: i32, height: i32) -> Generator<StdRng> {
        let params = GenParams {
            width,
            height,
            room_attempts: 0,
            seed: Some("carved".to_string()),
            ..GenParams::default()
        };
        Generator::new(params).unwrap()
    }

    const UP: Point = Point::new(0, -1);
    const DOWN: Point = Point::new(0, 1);
    const LEFT: Point = Point::new(-1, 0);
    const RIGHT: Point = Point::new(1, 0);

    #[test]
    fn test_reduce_slack_straightens_adjacent_corner_detour() {
        // A U-shaped detour on a 2x2 level: (0,0) down, across, back up
        // to (1,0). The two corners are adjacent, so the reroute goes
        // through the single diagonal cell.
        let mut g = blank_level(2, 2);
        g.draw_cell(Point::new(0, 0), OPEN);
        g.draw_cell_to(Point::new(0, 0), DOWN, OPEN);
        g.draw_cell_to(Point::new(0, 1), RIGHT, OPEN);
        g.draw_cell_to(Point::new(1, 1), UP, OPEN);

        let mut noop = |_: &Grid| {};
        let mut sink = quiet_sink(&mut noop);
        g.reduce_slack(&mut sink);

        // The detour row closes; the straight gap opens in its place.
        assert_eq!(g.cells().at(Point::new(0, 1)), Some(WALL));
        assert_eq!(g.cells().at(Point::new(1, 1)), Some(WALL));
        assert_eq!(g.cells().at(Point::new(0, 0)), Some(OPEN));
        assert_eq!(g.cells().at(Point::new(1, 0)), Some(OPEN));
        assert_eq!(g.cell_walls(Point::new(0, 0), OPEN), vec![RIGHT]);
    }

    #[test]
    fn test_reduce_slack_straightens_run_between_corners() {
        // A zig-zag with one straight cell between the corners; the first
        // walk attempt (up, into a dead end) fails and the retry along the
        // other opening finds the slack.
        let mut g = blank_level(3, 2);
        g.draw_cell(Point::new(0, 0), OPEN);
        g.draw_cell_to(Point::new(0, 0), DOWN, OPEN);
        g.draw_cell_to(Point::new(0, 1), RIGHT, OPEN);
        g.draw_cell_to(Point::new(1, 1), RIGHT, OPEN);
        g.draw_cell_to(Point::new(2, 1), UP, OPEN);

        let mut noop = |_: &Grid| {};
        let mut sink = quiet_sink(&mut noop);
        g.reduce_slack(&mut sink);

        for x in 0..3 {
            assert_eq!(g.cells().at(Point::new(x, 1)), Some(WALL), "x = {x}");
            assert_eq!(g.cells().at(Point::new(x, 0)), Some(OPEN), "x = {x}");
        }
        assert_eq!(g.cell_walls(Point::new(1, 0), OPEN), vec![LEFT, RIGHT]);
    }

    #[test]
    fn test_reduce_slack_skips_obstructed_detour() {
        // Same zig-zag, but the parallel row already holds an open cell,
        // so neither walk direction yields a clear reroute and the detour
        // must survive.
        let mut g = blank_level(3, 2);
        g.draw_cell(Point::new(0, 0), OPEN);
        g.draw_cell_to(Point::new(0, 0), DOWN, OPEN);
        g.draw_cell_to(Point::new(0, 1), RIGHT, OPEN);
        g.draw_cell_to(Point::new(1, 1), RIGHT, OPEN);
        g.draw_cell_to(Point::new(2, 1), UP, OPEN);
        g.draw_cell(Point::new(1, 0), OPEN);

        let before = g.cells().clone();
        let mut noop = |_: &Grid| {};
        let mut sink = quiet_sink(&mut noop);
        g.reduce_slack(&mut sink);

        assert_eq!(g.cells(), &before);
        assert_eq!(g.cells().at(Point::new(0, 1)), Some(OPEN));
    }

    #[test]
    fn test_cell_walls_reports_up_left_down_right() {
        let mut g = blank_level(3, 3);
        let center = Point::new(1, 1);
        g.draw_cell(center, OPEN);
        for d in [UP, LEFT, DOWN, RIGHT] {
            g.draw_cell_to(center, d, OPEN);
        }
        assert_eq!(g.cell_walls(center, OPEN), vec![UP, LEFT, DOWN, RIGHT]);
    }

    #[test]
    fn test_invalid_params_fail_fast() {
        let params = GenParams {
            min_size: 2,
            ..GenParams::default()
        };
        assert!(Generator::new(params).is_err());
    }

    #[test]
    fn test_seed_hash_is_stable() {
        assert_eq!(seed_hash("test"), seed_hash("test"));
        assert_ne!(seed_hash("test"), seed_hash("tset"));
    }
}
