//! Brushed DC motor on a two-input H-bridge
//!
//! # Truth table
//!
//! | IN1 | IN2 | Motor State                      |
//! |-----|-----|----------------------------------|
//! | 0   | 0   | Coast (motor freewheels)         |
//! | PWM | 0   | Forward (speed = PWM duty cycle) |
//! | 0   | PWM | Reverse (speed = PWM duty cycle) |
//!
//! The magnitude is quantized to the 8-bit resolution of the PWM timer.

use super::{map_range, ActuatorError, ActuatorPort, PwmPin, ACTUATOR_LIMIT};

/// PWM timer resolution (8 bit)
pub const HBRIDGE_DUTY_STEPS: i32 = 255;

/// Duty cycle fraction for a set-point magnitude
pub fn magnitude_to_duty(value: i16) -> f32 {
    let magnitude = i32::from(value.clamp(-ACTUATOR_LIMIT, ACTUATOR_LIMIT)).abs();
    let steps = map_range(magnitude, 0, i32::from(ACTUATOR_LIMIT), 0, HBRIDGE_DUTY_STEPS)
        .min(HBRIDGE_DUTY_STEPS);
    steps as f32 / HBRIDGE_DUTY_STEPS as f32
}

/// H-bridge motor driver
///
/// # Type Parameters
///
/// * `IN1` - PWM pin type for IN1 (first H-bridge input)
/// * `IN2` - PWM pin type for IN2 (second H-bridge input)
pub struct HBridgeMotor<IN1, IN2>
where
    IN1: PwmPin,
    IN2: PwmPin,
{
    in1: IN1,
    in2: IN2,
    value: i16,
}

impl<IN1, IN2> HBridgeMotor<IN1, IN2>
where
    IN1: PwmPin,
    IN2: PwmPin,
{
    pub fn new(in1: IN1, in2: IN2) -> Self {
        Self { in1, in2, value: 0 }
    }

    /// Get reference to IN1 pin (for testing)
    #[cfg(test)]
    pub fn in1(&self) -> &IN1 {
        &self.in1
    }

    /// Get reference to IN2 pin (for testing)
    #[cfg(test)]
    pub fn in2(&self) -> &IN2 {
        &self.in2
    }
}

impl<IN1, IN2> ActuatorPort for HBridgeMotor<IN1, IN2>
where
    IN1: PwmPin,
    IN2: PwmPin,
{
    fn init(&mut self) -> Result<(), ActuatorError> {
        self.set(0)
    }

    #[inline]
    fn set(&mut self, value: i16) -> Result<(), ActuatorError> {
        let value = value.clamp(-ACTUATOR_LIMIT, ACTUATOR_LIMIT);
        let duty = magnitude_to_duty(value);

        if value > 0 {
            // Forward: IN1=PWM, IN2=LOW
            self.in1.set_duty(duty)?;
            self.in2.set_duty(0.0)?;
        } else if value < 0 {
            // Reverse: IN1=LOW, IN2=PWM
            self.in1.set_duty(0.0)?;
            self.in2.set_duty(duty)?;
        } else {
            // Coast
            self.in1.set_duty(0.0)?;
            self.in2.set_duty(0.0)?;
        }
        self.value = value;
        Ok(())
    }

    fn value(&self) -> i16 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockPwmPin;
    use super::*;

    fn motor() -> HBridgeMotor<MockPwmPin, MockPwmPin> {
        HBridgeMotor::new(MockPwmPin::default(), MockPwmPin::default())
    }

    #[test]
    fn test_hbridge_motor_forward() {
        let mut motor = motor();
        motor.set(1000).unwrap();
        assert_eq!(motor.in1().duty, 1.0);
        assert_eq!(motor.in2().duty, 0.0);
    }

    #[test]
    fn test_hbridge_motor_reverse() {
        let mut motor = motor();
        motor.set(-500).unwrap();
        assert_eq!(motor.in1().duty, 0.0);
        assert!((motor.in2().duty - 127.0 / 255.0).abs() < 1e-6);
        assert_eq!(motor.value(), -500);
    }

    #[test]
    fn test_hbridge_motor_coast() {
        let mut motor = motor();
        motor.set(700).unwrap();
        motor.set(0).unwrap();
        assert_eq!(motor.in1().duty, 0.0);
        assert_eq!(motor.in2().duty, 0.0);
    }

    #[test]
    fn test_duty_quantization() {
        assert_eq!(magnitude_to_duty(0), 0.0);
        assert_eq!(magnitude_to_duty(3), 0.0);
        assert_eq!(magnitude_to_duty(-1000), 1.0);
        assert_eq!(magnitude_to_duty(i16::MIN), 1.0);
    }

    #[test]
    fn test_pwm_failure_propagates() {
        let mut motor = HBridgeMotor::new(
            MockPwmPin {
                fail: true,
                ..MockPwmPin::default()
            },
            MockPwmPin::default(),
        );
        assert_eq!(motor.set(100), Err(ActuatorError::HardwareFault));
        assert_eq!(motor.value(), 0);
    }
}
