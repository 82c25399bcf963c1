//! Simulated PWM output.
//!
//! Records the duty cycle the actuator mapping wrote, so the runner and
//! tests can check what would have reached the hardware.

use std::sync::{Arc, Mutex};

use wst_core::actuator::{ActuatorError, PwmPin};

#[derive(Debug, Default)]
struct PwmState {
    duty: f32,
    writes: u32,
}

/// Simulated PWM channel.
///
/// Clones share state: hand one to the actuator, keep one to observe it.
#[derive(Debug, Clone, Default)]
pub struct SimPwmPin {
    state: Arc<Mutex<PwmState>>,
}

impl SimPwmPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last duty cycle written (0.0 to 1.0).
    pub fn duty(&self) -> f32 {
        self.state.lock().map(|s| s.duty).unwrap_or(0.0)
    }

    /// Number of writes since creation.
    pub fn writes(&self) -> u32 {
        self.state.lock().map(|s| s.writes).unwrap_or(0)
    }
}

impl PwmPin for SimPwmPin {
    fn set_duty(&mut self, duty: f32) -> Result<(), ActuatorError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ActuatorError::HardwareFault)?;
        state.duty = duty.clamp(0.0, 1.0);
        state.writes += 1;
        Ok(())
    }
}
