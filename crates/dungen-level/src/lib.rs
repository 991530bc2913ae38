//! **dungen-level** — procedural level generation for the *dungen* toolkit.
//!
//! The pipeline places non-touching rooms, floods the remaining space with
//! a maze, connects rooms with doors, then runs a series of cleanup passes
//! (dead-end retraction, slack reduction, wall relaxation, artifact
//! removal) until the level settles. Run it directly via [`Generator`], or
//! on a background thread via [`LevelWorker`].
//!
//! ```no_run
//! use dungen_level::{GenParams, Generator};
//!
//! let params = GenParams {
//!     seed: Some("cavern-12".to_string()),
//!     ..GenParams::default()
//! };
//! let mut generator = Generator::new(params)?;
//! generator.generate(|_frame| {});
//! let level = generator.expanded();
//! # Ok::<(), dungen_level::ConfigError>(())
//! ```

pub mod config;
pub mod generator;
pub mod worker;

pub use config::{ConfigError, GenParams};
pub use generator::{Generator, Room};
pub use worker::{LevelMeta, LevelWorker, Reply, Request, WorkerGone};
