//! Background generation worker.
//!
//! [`LevelWorker`] runs the generation pipeline on its own thread and talks
//! to the caller over a pair of mpsc channels. The caller submits
//! [`Request`]s and drains [`Reply`]s at its own pace: intermediate frames
//! arrive as [`Reply::Step`], the finished level as [`Reply::Complete`], and
//! level metadata on demand as [`Reply::Metadata`].

use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use dungen_core::Grid;
use log::{debug, warn};

use crate::config::{ConfigError, GenParams};
use crate::generator::{Generator, Room};

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

/// Messages the caller sends to the worker thread.
#[derive(Debug, Clone)]
pub enum Request {
    /// Generate a level with the given parameters.
    Generate(GenParams),
    /// Ask for metadata about the most recently generated level.
    Metadata,
    /// Stop the worker thread. Sent automatically on drop.
    Shutdown,
}

/// Messages the worker thread sends back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// An intermediate snapshot of the expanded grid.
    Step(Grid),
    /// Generation finished; the final expanded grid.
    Complete(Grid),
    /// Metadata for the last completed generation; `None` before the
    /// first one finishes.
    Metadata(Option<LevelMeta>),
    /// The submitted parameters were rejected.
    Rejected(ConfigError),
}

/// Summary of a generated level.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelMeta {
    pub rooms: Vec<Room>,
    /// Level width in cells.
    pub width: i32,
    /// Level height in cells.
    pub height: i32,
    pub wall_width: i32,
    pub maze_width: i32,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Handle to a background generation thread.
///
/// Dropping the handle shuts the thread down and joins it.
pub struct LevelWorker {
    requests: Sender<Request>,
    replies: Receiver<Reply>,
    handle: Option<JoinHandle<()>>,
}

impl LevelWorker {
    /// Spawn the worker thread.
    pub fn spawn() -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (rep_tx, rep_rx) = mpsc::channel::<Reply>();
        let handle = thread::Builder::new()
            .name("dungen-level".to_string())
            .spawn(move || run(&req_rx, &rep_tx))?;
        Ok(Self {
            requests: req_tx,
            replies: rep_rx,
            handle: Some(handle),
        })
    }

    /// Submit a generation request. Replies arrive via [`recv`](Self::recv)
    /// or [`try_recv`](Self::try_recv).
    pub fn generate(&self, params: GenParams) -> Result<(), WorkerGone> {
        self.requests
            .send(Request::Generate(params))
            .map_err(|_| WorkerGone)
    }

    /// Ask for metadata about the last completed level.
    pub fn request_metadata(&self) -> Result<(), WorkerGone> {
        self.requests
            .send(Request::Metadata)
            .map_err(|_| WorkerGone)
    }

    /// Block until the next reply.
    pub fn recv(&self) -> Result<Reply, RecvError> {
        self.replies.recv()
    }

    /// Fetch the next reply without blocking.
    pub fn try_recv(&self) -> Result<Reply, TryRecvError> {
        self.replies.try_recv()
    }
}

impl Drop for LevelWorker {
    fn drop(&mut self) {
        // The send fails if the thread already exited; joining is still
        // fine either way.
        let _ = self.requests.send(Request::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("level worker thread panicked");
            }
        }
    }
}

/// The worker thread went away; the request was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerGone;

impl std::fmt::Display for WorkerGone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("level worker thread is gone")
    }
}

impl std::error::Error for WorkerGone {}

// ---------------------------------------------------------------------------
// Thread body
// ---------------------------------------------------------------------------

fn run(requests: &Receiver<Request>, replies: &Sender<Reply>) {
    // Metadata refers to the most recent completed generation.
    let mut last: Option<LevelMeta> = None;

    while let Ok(request) = requests.recv() {
        match request {
            Request::Generate(params) => match Generator::new(params) {
                Ok(mut generator) => {
                    generator.generate(|grid| {
                        // A send failure means the caller hung up; frames
                        // are best-effort so keep generating.
                        let _ = replies.send(Reply::Step(grid.clone()));
                    });
                    let p = generator.params();
                    last = Some(LevelMeta {
                        rooms: generator.rooms().to_vec(),
                        width: p.width,
                        height: p.height,
                        wall_width: p.wall_width,
                        maze_width: p.maze_width,
                    });
                    if replies
                        .send(Reply::Complete(generator.expanded().clone()))
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => {
                    debug!("rejecting generation request: {err}");
                    if replies.send(Reply::Rejected(err)).is_err() {
                        break;
                    }
                }
            },
            Request::Metadata => {
                if replies.send(Reply::Metadata(last.clone())).is_err() {
                    break;
                }
            }
            Request::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: &str) -> GenParams {
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

    fn drain_until_complete(worker: &LevelWorker) -> (usize, Grid) {
        let mut steps = 0;
        loop {
            match worker.recv().unwrap() {
                Reply::Step(_) => steps += 1,
                Reply::Complete(grid) => return (steps, grid),
                other => panic!("unexpected reply: {other:?}"),
            }
        }
    }

    #[test]
    fn test_generate_streams_steps_then_complete() {
        let worker = LevelWorker::spawn().unwrap();
        worker.generate(params("worker")).unwrap();
        let (steps, grid) = drain_until_complete(&worker);
        // One frame per pass plus the final frame.
        assert_eq!(steps, 9);
        assert_eq!(grid.width(), 31);
        assert_eq!(grid.height(), 31);
    }

    #[test]
    fn test_worker_is_deterministic_across_runs() {
        let worker = LevelWorker::spawn().unwrap();
        worker.generate(params("repeat")).unwrap();
        let (_, first) = drain_until_complete(&worker);
        worker.generate(params("repeat")).unwrap();
        let (_, second) = drain_until_complete(&worker);
        assert_eq!(first, second);
    }

    #[test]
    fn test_metadata_reflects_last_generation() {
        let worker = LevelWorker::spawn().unwrap();
        worker.generate(params("meta")).unwrap();
        let _ = drain_until_complete(&worker);
        worker.request_metadata().unwrap();
        match worker.recv().unwrap() {
            Reply::Metadata(Some(meta)) => {
                assert_eq!(meta.width, 10);
                assert_eq!(meta.height, 10);
                assert_eq!(meta.wall_width, 1);
                assert_eq!(meta.maze_width, 2);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_metadata_is_none_before_first_generation() {
        let worker = LevelWorker::spawn().unwrap();
        worker.request_metadata().unwrap();
        assert_eq!(worker.recv().unwrap(), Reply::Metadata(None));
    }

    #[test]
    fn test_metadata_queued_behind_generate_arrives_after_complete() {
        let worker = LevelWorker::spawn().unwrap();
        worker.generate(params("ordering")).unwrap();
        worker.request_metadata().unwrap();
        let _ = drain_until_complete(&worker);
        match worker.recv().unwrap() {
            Reply::Metadata(Some(_)) => {}
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_invalid_params() {
        let worker = LevelWorker::spawn().unwrap();
        let bad = GenParams {
            min_size: 1,
            ..GenParams::default()
        };
        worker.generate(bad).unwrap();
        match worker.recv().unwrap() {
            Reply::Rejected(_) => {}
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_shutdown_on_drop() {
        let worker = LevelWorker::spawn().unwrap();
        drop(worker);
    }
}
