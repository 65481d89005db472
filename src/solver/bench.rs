//! Wall-clock stopwatch and search-node counter.
//!
//! The solver reads time only through this type, and only at iteration
//! boundaries, never inside inner BFS loops.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Bench {
    started: Instant,
    elapsed: Option<Duration>,
    nodes: u64,
}

impl Default for Bench {
    fn default() -> Self {
        Self::new()
    }
}

impl Bench {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            elapsed: None,
            nodes: 0,
        }
    }

    /// Restart the stopwatch.
    pub fn start(&mut self) {
        self.started = Instant::now();
        self.elapsed = None;
    }

    pub fn stop(&mut self) {
        self.elapsed = Some(self.started.elapsed());
    }

    #[inline]
    pub fn node(&mut self) {
        self.nodes += 1;
    }

    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Time between the last `start` and `stop`; falls back to now when the
    /// stopwatch was never stopped.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    #[inline]
    pub fn elapsed_to_now(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn nodes_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.nodes as f64 / secs
        }
    }
}
