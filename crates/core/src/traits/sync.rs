//! Shared state between an interrupt context and the main loop.
//!
//! The only cross-context data in the core is the range sampler's echo
//! latch. It is written from an edge interrupt and read from the superloop,
//! so every access goes through a short critical section.

use core::cell::RefCell;
use critical_section::Mutex;

/// Platform-agnostic synchronized state access.
///
/// Closures passed to `with`/`with_mut` run inside the synchronization
/// region and must not block.
pub trait SharedState<T> {
    /// Access state immutably.
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Access state mutably.
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

/// State guarded by a `critical-section` mutex.
///
/// On single-core targets the critical section masks interrupts, so the
/// interrupt side never waits on a lock. On the host the `std`
/// implementation of `critical-section` is used.
pub struct CriticalSectionState<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionState<T> {
    /// Creates a new `CriticalSectionState` wrapping the given value.
    ///
    /// This is a const fn, allowing static initialization.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }
}

impl<T> SharedState<T> for CriticalSectionState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}
