//! Generation parameters and their validation.

use std::error::Error;
use std::fmt;

/// Parameters for a level generation run.
///
/// All fields have defaults; construct with `GenParams::default()` and
/// override what you need. Parameters are validated when a
/// [`Generator`](crate::Generator) is created, so a malformed set fails
/// fast instead of producing a corrupt grid.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenParams {
    /// Level width in cells.
    pub width: i32,
    /// Level height in cells.
    pub height: i32,
    /// How many room placements to attempt. Attempts whose candidate
    /// overlaps or touches an accepted room are skipped, not retried, so
    /// the final room count may be lower.
    pub room_attempts: i32,
    /// Minimum room side length, in cells.
    pub min_size: i32,
    /// Maximum room side length, in cells.
    pub max_size: i32,
    /// Corridor straightness bias, 0–100. At 0 the maze carver always
    /// continues straight when it can; at 100 it always picks a random
    /// direction.
    pub windyness: i32,
    /// Wall thickness in the expanded grid.
    pub wall_width: i32,
    /// Corridor/cell thickness in the expanded grid.
    pub maze_width: i32,
    /// Minimum doors per room.
    pub min_doors: i32,
    /// Maximum doors per room (clamped to 4, one per side).
    pub max_doors: i32,
    /// Emit a grid snapshot after every individual write, for progressive
    /// visualization. A snapshot after each pass is emitted regardless.
    pub animate: bool,
    /// Delay between animated snapshots, in milliseconds.
    pub animation_delay: u64,
    /// Optional seed. Identical seeds and parameters produce identical
    /// levels; `None` seeds from entropy.
    pub seed: Option<String>,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            width: 25,
            height: 25,
            room_attempts: 50,
            min_size: 5,
            max_size: 8,
            windyness: 100,
            wall_width: 1,
            maze_width: 2,
            min_doors: 1,
            max_doors: 4,
            animate: false,
            animation_delay: 10,
            seed: None,
        }
    }
}

impl GenParams {
    /// Check the parameter set for contract violations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ConfigError::Dimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.wall_width < 1 || self.maze_width < 1 {
            return Err(ConfigError::Thickness {
                wall: self.wall_width,
                maze: self.maze_width,
            });
        }
        if !(0..=100).contains(&self.windyness) {
            return Err(ConfigError::Windyness(self.windyness));
        }
        if self.room_attempts > 0 {
            // Rooms need an interior span for door placement (size >= 3)
            // and a one-cell margin to the level border.
            let limit = self.width.min(self.height) - 2;
            if self.min_size < 3 || self.min_size > self.max_size || self.max_size > limit {
                return Err(ConfigError::RoomSize {
                    min: self.min_size,
                    max: self.max_size,
                    limit,
                });
            }
            if self.min_doors < 1 || self.min_doors > 4 || self.min_doors > self.max_doors {
                return Err(ConfigError::Doors {
                    min: self.min_doors,
                    max: self.max_doors,
                });
            }
        }
        Ok(())
    }
}

/// A parameter set that cannot produce a well-formed level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Non-positive grid dimensions.
    Dimensions { width: i32, height: i32 },
    /// Wall or corridor thickness below one.
    Thickness { wall: i32, maze: i32 },
    /// Windyness outside 0–100.
    Windyness(i32),
    /// Room sizes outside `3 ..= min(width, height) - 2` or min > max.
    RoomSize { min: i32, max: i32, limit: i32 },
    /// Door counts outside `1 ..= 4` or min > max.
    Doors { min: i32, max: i32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimensions { width, height } => {
                write!(f, "grid dimensions must be positive, got {width}x{height}")
            }
            Self::Thickness { wall, maze } => write!(
                f,
                "wall and maze widths must be at least 1, got wall {wall}, maze {maze}"
            ),
            Self::Windyness(w) => write!(f, "windyness must be in 0..=100, got {w}"),
            Self::RoomSize { min, max, limit } => write!(
                f,
                "room sizes must satisfy 3 <= min <= max <= {limit}, got {min}..={max}"
            ),
            Self::Doors { min, max } => write!(
                f,
                "door counts must satisfy 1 <= min <= max and min <= 4, got {min}..={max}"
            ),
        }
    }
}

impl Error for ConfigError {}
