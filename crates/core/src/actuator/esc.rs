//! Brushless ESC channel
//!
//! Forward-only: negative set-points are treated as zero. Set-points below
//! the deadzone floor are raised to it so the motor never stalls at a
//! barely-spinning command. After `init` the ESC holds the minimum pulse
//! until the arming delay has elapsed.

use super::servo::pulse_to_duty_cycle;
use super::{map_range, ActuatorError, ActuatorPort, PwmPin, ACTUATOR_LIMIT};

/// Pulse width at zero throttle, also the arming pulse (μs)
pub const ESC_MIN_PULSE_US: u16 = 1000;

/// Pulse width at full throttle (μs)
pub const ESC_MAX_PULSE_US: u16 = 2000;

/// Smallest non-zero set-point
pub const ESC_DEADZONE_FLOOR: i16 = 200;

/// Time the ESC needs at the minimum pulse before it accepts throttle
pub const ESC_ARM_DELAY_US: u64 = 2_000_000;

/// Pulse width for a set-point
pub fn esc_pulse_us(value: i16) -> u16 {
    let mut speed = value.clamp(0, ACTUATOR_LIMIT);
    if speed > 0 && speed < ESC_DEADZONE_FLOOR {
        speed = ESC_DEADZONE_FLOOR;
    }
    map_range(
        i32::from(speed),
        0,
        i32::from(ACTUATOR_LIMIT),
        i32::from(ESC_MIN_PULSE_US),
        i32::from(ESC_MAX_PULSE_US),
    ) as u16
}

pub struct EscActuator<P: PwmPin> {
    pin: P,
    value: i16,
    arm_started_us: Option<u64>,
    armed: bool,
}

impl<P: PwmPin> EscActuator<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            value: 0,
            arm_started_us: None,
            armed: false,
        }
    }

    /// Arming delay elapsed; throttle set-points reach the motor
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    fn write_pulse(&mut self, pulse_us: u16) -> Result<(), ActuatorError> {
        self.pin.set_duty(pulse_to_duty_cycle(pulse_us))
    }
}

impl<P: PwmPin> ActuatorPort for EscActuator<P> {
    fn init(&mut self) -> Result<(), ActuatorError> {
        self.value = 0;
        self.armed = false;
        self.arm_started_us = None;
        self.write_pulse(ESC_MIN_PULSE_US)
    }

    fn set(&mut self, value: i16) -> Result<(), ActuatorError> {
        let value = value.clamp(0, ACTUATOR_LIMIT);
        if self.armed {
            self.write_pulse(esc_pulse_us(value))?;
        }
        self.value = value;
        Ok(())
    }

    fn tick(&mut self, now_us: u64) {
        if self.armed {
            return;
        }
        let started = *self.arm_started_us.get_or_insert(now_us);
        if now_us.saturating_sub(started) >= ESC_ARM_DELAY_US {
            self.armed = true;
            crate::log_info!("ESC armed");
            if let Err(e) = self.write_pulse(esc_pulse_us(self.value)) {
                crate::log_warn!("ESC write failed: {}", e);
            }
        }
    }

    fn value(&self) -> i16 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockPwmPin;
    use super::*;

    #[test]
    fn pulse_mapping_with_deadzone() {
        assert_eq!(esc_pulse_us(-300), 1000);
        assert_eq!(esc_pulse_us(0), 1000);
        assert_eq!(esc_pulse_us(1), 1200);
        assert_eq!(esc_pulse_us(199), 1200);
        assert_eq!(esc_pulse_us(200), 1200);
        assert_eq!(esc_pulse_us(500), 1500);
        assert_eq!(esc_pulse_us(1000), 2000);
        assert_eq!(esc_pulse_us(i16::MAX), 2000);
    }

    #[test]
    fn holds_minimum_pulse_until_armed() {
        let mut esc = EscActuator::new(MockPwmPin::default());
        esc.init().unwrap();
        assert!((esc.pin().duty - 0.05).abs() < 1e-6);

        esc.tick(0);
        esc.set(800).unwrap();
        assert_eq!(esc.value(), 800);
        assert!((esc.pin().duty - 0.05).abs() < 1e-6);

        esc.tick(1_999_999);
        assert!(!esc.is_armed());

        esc.tick(2_000_000);
        assert!(esc.is_armed());
        assert!((esc.pin().duty - 0.09).abs() < 1e-6);

        esc.set(0).unwrap();
        assert!((esc.pin().duty - 0.05).abs() < 1e-6);
    }

    #[test]
    fn negative_setpoint_is_zero() {
        let mut esc = EscActuator::new(MockPwmPin::default());
        esc.init().unwrap();
        esc.set(-500).unwrap();
        assert_eq!(esc.value(), 0);
    }
}
