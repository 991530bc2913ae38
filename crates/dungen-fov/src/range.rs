//! Debounced control for the view radius.
//!
//! Interactive callers adjust the radius freely (scroll wheel, keys), but
//! recomputing visibility is comparatively expensive, so requested changes
//! only take effect on a [`tick`](RangeControl::tick) at most once per
//! commit interval. Requests that are out of bounds, or that land between
//! commits, revert to the committed value.

use std::time::{Duration, Instant};

/// Smallest committable radius.
pub const MIN_RANGE: i32 = 2;

/// Largest committable radius.
pub const MAX_RANGE: i32 = 50;

/// Interval between radius commits.
pub const COMMIT_INTERVAL: Duration = Duration::from_millis(100);

/// A rate-limited view radius.
#[derive(Debug, Clone)]
pub struct RangeControl {
    requested: i32,
    committed: i32,
    interval: Duration,
    last_commit: Instant,
}

impl RangeControl {
    /// Create a control with the given starting radius, using
    /// [`COMMIT_INTERVAL`].
    pub fn new(initial: i32) -> Self {
        Self::with_interval(initial, COMMIT_INTERVAL)
    }

    /// Create a control with a custom commit interval.
    pub fn with_interval(initial: i32, interval: Duration) -> Self {
        Self {
            requested: initial,
            committed: initial,
            interval,
            // Allow the first tick to commit immediately.
            last_commit: Instant::now() - interval,
        }
    }

    /// The radius visibility should currently be computed with.
    pub fn committed(&self) -> i32 {
        self.committed
    }

    /// The radius the caller last asked for.
    pub fn requested(&self) -> i32 {
        self.requested
    }

    /// Request a new radius. Takes effect on a later tick.
    pub fn request(&mut self, range: i32) {
        self.requested = range;
    }

    /// Nudge the requested radius by a delta.
    pub fn adjust(&mut self, delta: i32) {
        self.requested += delta;
    }

    /// Advance the control. Returns the newly committed radius if this tick
    /// accepted a change; otherwise the pending request reverts.
    pub fn tick(&mut self) -> Option<i32> {
        let changed = self.requested != self.committed;
        if self.last_commit.elapsed() >= self.interval {
            self.last_commit = Instant::now();
            if changed && (MIN_RANGE..=MAX_RANGE).contains(&self.requested) {
                self.committed = self.requested;
                return Some(self.committed);
            }
        }
        self.requested = self.committed;
        None
    }
}

impl Default for RangeControl {
    fn default() -> Self {
        Self::new(40)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commits_valid_request() {
        let mut rc = RangeControl::with_interval(40, Duration::ZERO);
        rc.request(10);
        assert_eq!(rc.tick(), Some(10));
        assert_eq!(rc.committed(), 10);
    }

    #[test]
    fn test_rejects_out_of_bounds_request() {
        let mut rc = RangeControl::with_interval(40, Duration::ZERO);
        rc.request(MAX_RANGE + 1);
        assert_eq!(rc.tick(), None);
        assert_eq!(rc.committed(), 40);
        assert_eq!(rc.requested(), 40);

        rc.request(MIN_RANGE - 1);
        assert_eq!(rc.tick(), None);
        assert_eq!(rc.requested(), 40);
    }

    #[test]
    fn test_reverts_request_between_commits() {
        let mut rc = RangeControl::with_interval(40, Duration::from_secs(3600));
        // The constructor backdates the first commit window.
        rc.request(20);
        assert_eq!(rc.tick(), Some(20));

        // The next window is an hour away; requests cannot stick.
        rc.request(30);
        assert_eq!(rc.tick(), None);
        assert_eq!(rc.committed(), 20);
        assert_eq!(rc.requested(), 20);
    }

    #[test]
    fn test_adjust_accumulates() {
        let mut rc = RangeControl::with_interval(10, Duration::ZERO);
        rc.adjust(2);
        rc.adjust(3);
        assert_eq!(rc.requested(), 15);
        assert_eq!(rc.tick(), Some(15));
    }

    #[test]
    fn test_unchanged_request_is_no_commit() {
        let mut rc = RangeControl::with_interval(25, Duration::ZERO);
        assert_eq!(rc.tick(), None);
        assert_eq!(rc.committed(), 25);
    }
}
