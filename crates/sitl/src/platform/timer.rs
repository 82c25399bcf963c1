//! Host clocks for the control loop.
//!
//! - [`HostClock`]: wall-clock time since construction
//! - [`SimClock`]: shared atomic counter advanced by hand, for
//!   deterministic runs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use wst_core::traits::TimeSource;

/// Monotonic wall clock starting at zero.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    start: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for HostClock {
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Simulated time backed by a shared atomic counter.
///
/// Clones share the counter, so a test can keep one handle and advance
/// time while the control loop reads another.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    time_us: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance simulation time by the given number of microseconds.
    pub fn advance_us(&self, us: u64) {
        self.time_us.fetch_add(us, Ordering::Relaxed);
    }

    /// Set simulation time to an absolute value.
    pub fn set_us(&self, us: u64) {
        self.time_us.store(us, Ordering::Relaxed);
    }
}

impl TimeSource for SimClock {
    fn now_us(&self) -> u64 {
        self.time_us.load(Ordering::Relaxed)
    }
}
