//! Cooperative time-slicing for long renders.
//!
//! Rendering a song takes seconds. Every long-running stage exposes a
//! `step(&mut budget)` that does a bounded amount of work and returns, so
//! the host can keep its own loop responsive. A budget is consulted only
//! at safe suspension points (between rows, or every [`CHECK_INTERVAL`]
//! frames of bulk processing); all running state lives in the stage
//! itself, so the next `step` resumes exactly where the last one stopped.

/// Frames of bulk work (delay, merge, packaging) between budget checks.
pub const CHECK_INTERVAL: usize = 1000;

/// Decides when a slice of work should end.
pub trait SliceBudget {
    /// Called at each suspension point. Returns true if the caller should
    /// stop and resume in a later slice.
    fn should_yield(&mut self) -> bool;
}

/// Never yields; runs a stage to completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl SliceBudget for Unbounded {
    fn should_yield(&mut self) -> bool {
        false
    }
}

/// Yields after a fixed number of suspension points.
///
/// Deterministic, so it's what tests use to exercise resumption.
#[derive(Clone, Copy, Debug)]
pub struct WorkBudget {
    remaining: u32,
}

impl WorkBudget {
    pub const fn new(checks: u32) -> Self {
        Self { remaining: checks }
    }
}

impl SliceBudget for WorkBudget {
    fn should_yield(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}

#[cfg(feature = "std")]
pub use wall_clock::TimeBudget;

#[cfg(feature = "std")]
mod wall_clock {
    use super::SliceBudget;
    use std::time::{Duration, Instant};

    /// Yields once a wall-clock duration has elapsed since the slice began.
    #[derive(Clone, Copy, Debug)]
    pub struct TimeBudget {
        start: Instant,
        limit: Duration,
    }

    impl TimeBudget {
        /// Start a slice now.
        pub fn new(limit: Duration) -> Self {
            Self { start: Instant::now(), limit }
        }

        pub fn from_millis(millis: u64) -> Self {
            Self::new(Duration::from_millis(millis))
        }
    }

    impl SliceBudget for TimeBudget {
        fn should_yield(&mut self) -> bool {
            self.start.elapsed() > self.limit
        }
    }
}

/// Result of one `step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// More work remains; call `step` again.
    Pending,
    /// The stage is complete.
    Done,
}

impl StepStatus {
    pub fn is_done(self) -> bool {
        self == StepStatus::Done
    }
}
