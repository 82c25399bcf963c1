//! Time abstraction for the control loop.
//!
//! All timing inside the core is done in microseconds since boot. The
//! orchestrator reads the clock once per tick and hands the timestamp down,
//! so every component sees the same "now" within a tick.

use core::cell::Cell;

/// Platform-agnostic monotonic clock.
///
/// # Example
///
/// ```
/// use wst_core::traits::{MockTime, TimeSource};
///
/// fn telemetry_due<T: TimeSource>(clock: &T, last_sent_us: u64) -> bool {
///     clock.elapsed_since(last_sent_us) >= 100_000
/// }
///
/// let clock = MockTime::new();
/// clock.advance_ms(150);
/// assert!(telemetry_due(&clock, 0));
/// ```
pub trait TimeSource: Clone + Send + Sync {
    /// Returns current time in microseconds since system start.
    fn now_us(&self) -> u64;

    /// Returns current time in milliseconds since system start.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    /// Returns elapsed time in microseconds since a reference point.
    ///
    /// Saturates to zero if the reference lies in the future.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

/// A borrowed clock is still a clock; lets tests keep a handle on the
/// `MockTime` they gave to the control loop.
impl<T: TimeSource> TimeSource for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock clock with manual advancement.
#[derive(Clone, Default)]
pub struct MockTime {
    current_us: Cell<u64>,
}

// Safety: MockTime is only used in single-threaded test contexts where Cell
// is safe. The Send + Sync bounds exist for embedded clocks shared with
// interrupt handlers.
unsafe impl Send for MockTime {}
unsafe impl Sync for MockTime {}

impl MockTime {
    /// Creates a new `MockTime` starting at time 0.
    pub fn new() -> Self {
        Self {
            current_us: Cell::new(0),
        }
    }

    /// Creates a new `MockTime` starting at the specified time.
    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Cell::new(us),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    /// Advances the clock by `us` microseconds.
    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }

    /// Advances the clock by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(ms * 1000);
    }
}

impl TimeSource for MockTime {
    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}
