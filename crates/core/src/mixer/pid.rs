//! Fixed-period PID axis controller
//!
//! Wraps [`pid::Pid`] with a sample-period gate. Gains are given per second
//! and converted once to per-sample gains for the configured period, so a
//! retuned period does not change the loop's behavior in time:
//!
//! - `ki_sample = ki * period_s`
//! - `kd_sample = kd / period_s`
//!
//! The derivative acts on the measurement, and the integral term is bounded
//! by the output limit.

use pid::Pid;

/// Controller gains (per second)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// One stabilized axis
pub struct AxisController {
    pid: Pid<f32>,
    period_us: u64,
    last_compute_us: Option<u64>,
    output: f32,
}

impl AxisController {
    /// # Arguments
    ///
    /// * `gains` - Proportional, integral and derivative gains (per second)
    /// * `limit` - Output clamp, applied symmetrically (actuator units)
    /// * `period_us` - Minimum time between two computations
    pub fn new(gains: PidGains, limit: f32, period_us: u64) -> Self {
        let period_us = period_us.max(1);
        let period_s = period_us as f32 / 1_000_000.0;
        let limit = libm::fabsf(limit);

        let mut pid = Pid::new(0.0, limit);
        pid.p(gains.kp, limit)
            .i(gains.ki * period_s, limit)
            .d(gains.kd / period_s, limit);

        Self {
            pid,
            period_us,
            last_compute_us: None,
            output: 0.0,
        }
    }

    /// Run one controller step if a period boundary has been reached
    ///
    /// Returns `None` between period boundaries; the held output is then
    /// available from [`output`](Self::output). The first call always
    /// computes.
    pub fn compute(&mut self, setpoint: f32, measurement: f32, now_us: u64) -> Option<f32> {
        if let Some(last) = self.last_compute_us {
            if now_us.saturating_sub(last) < self.period_us {
                return None;
            }
        }
        self.last_compute_us = Some(now_us);

        self.pid.setpoint(setpoint);
        self.output = self.pid.next_control_output(measurement).output;
        Some(self.output)
    }

    /// Most recent output
    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Clear the integrator and held output; the next call computes
    pub fn reset(&mut self) {
        self.pid.reset_integral_term();
        self.output = 0.0;
        self.last_compute_us = None;
    }
}
