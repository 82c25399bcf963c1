//! Time and shared-state abstractions.
//!
//! The control loop never reads a hardware timer or masks interrupts
//! directly; it goes through these traits so the same code runs on the
//! ESP32 superloop, in host unit tests ([`MockTime`]) and in the SITL
//! runner.

pub mod sync;
pub mod time;

pub use sync::{CriticalSectionState, SharedState};
pub use time::{MockTime, TimeSource};
