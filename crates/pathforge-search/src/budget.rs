//! Run budget and stop reasons.
//!
//! Limits are cooperative: they are checked between generations, so a
//! generation in flight always finishes. Hitting a limit ends the run with
//! the archive built so far.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Archive large and fit enough.
    Converged,
    MaxGenerations,
    /// Wall-clock budget exceeded.
    Timeout,
    /// Nothing to search: no methods, no seeds.
    Empty,
}

#[derive(Debug)]
pub struct Budget {
    max_generations: u32,
    timeout: Option<Duration>,
    start: Instant,
}

impl Budget {
    /// `timeout_seconds == 0` means no wall-clock limit.
    pub fn new(max_generations: u32, timeout_seconds: u64) -> Self {
        Self {
            max_generations,
            timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
            start: Instant::now(),
        }
    }

    /// Whether generation `completed` (0-based count of finished
    /// generations) may start.
    pub fn check(&self, completed: u32) -> Option<StopReason> {
        if completed >= self.max_generations {
            return Some(StopReason::MaxGenerations);
        }
        if self.timed_out() {
            return Some(StopReason::Timeout);
        }
        None
    }

    pub fn timed_out(&self) -> bool {
        self.timeout.is_some_and(|limit| self.start.elapsed() >= limit)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
