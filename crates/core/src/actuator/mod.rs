//! Actuator channels
//!
//! Every channel takes a set-point in `-1000..=1000` (ESCs use only the
//! non-negative half) and turns it into a PWM duty cycle through a
//! [`PwmPin`]. Duty-cycle generation itself belongs to the board crate.
//!
//! # Channels
//!
//! - [`servo`]: Hobby servo, set-point → angle → 50 Hz pulse
//! - [`esc`]: Brushless ESC with arming delay and low-speed deadzone
//! - [`hbridge`]: Brushed DC motor on a two-input H-bridge

pub mod esc;
pub mod hbridge;
pub mod servo;

pub use esc::EscActuator;
pub use hbridge::HBridgeMotor;
pub use servo::{ServoActuator, ServoConfig};

use core::fmt;

/// Set-point range limit shared by all channels
pub const ACTUATOR_LIMIT: i16 = 1000;

/// Actuator error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// PWM channel unavailable or write failed
    HardwareFault,
    /// Mixer variant needs a channel that was not provided
    MissingChannel,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorError::HardwareFault => write!(f, "actuator hardware fault"),
            ActuatorError::MissingChannel => write!(f, "actuator channel missing"),
        }
    }
}

/// PWM pin abstraction
///
/// Platform-specific implementations wrap their HAL's PWM types.
pub trait PwmPin {
    /// Set PWM duty cycle as a fraction [0.0, 1.0]
    fn set_duty(&mut self, duty: f32) -> Result<(), ActuatorError>;
}

/// One actuator channel driven by a mixer
pub trait ActuatorPort {
    /// Attach the output and drive it to its neutral state
    fn init(&mut self) -> Result<(), ActuatorError>;

    /// Apply a set-point; out-of-range values are clamped
    fn set(&mut self, value: i16) -> Result<(), ActuatorError>;

    /// Periodic housekeeping (arming timers); called once per mixer update
    fn tick(&mut self, _now_us: u64) {}

    /// Last set-point applied
    fn value(&self) -> i16;
}

/// Linear integer re-mapping with truncation toward zero
///
/// `map_range(v, in_min, in_max, out_min, out_max)`; a degenerate input
/// range maps everything to `out_min`.
pub fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}
