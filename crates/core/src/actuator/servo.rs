//! Hobby servo channel
//!
//! A set-point of `-1000..=1000` is mapped onto the configured angle range,
//! and the angle onto the pulse range the servo was attached with
//! (0° → `min_pulse_us`, 180° → `max_pulse_us`). The pulse is emitted at
//! 50 Hz.

use super::{map_range, ActuatorError, ActuatorPort, PwmPin, ACTUATOR_LIMIT};

/// 50 Hz frame period
pub const SERVO_PERIOD_US: u16 = 20_000;

/// Full mechanical travel of a standard servo (degrees)
pub const SERVO_TRAVEL_DEG: i32 = 180;

/// Servo calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoConfig {
    /// Angle at set-point -1000 (degrees)
    pub min_angle: i32,
    /// Angle at set-point +1000 (degrees)
    pub max_angle: i32,
    /// Pulse width at 0° (μs)
    pub min_pulse_us: u16,
    /// Pulse width at 180° (μs)
    pub max_pulse_us: u16,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_angle: 0,
            max_angle: 180,
            min_pulse_us: 1000,
            max_pulse_us: 2000,
        }
    }
}

impl ServoConfig {
    /// Angle commanded by a set-point
    pub fn angle(&self, value: i16) -> i32 {
        let clamped = i32::from(value.clamp(-ACTUATOR_LIMIT, ACTUATOR_LIMIT));
        map_range(
            clamped,
            -i32::from(ACTUATOR_LIMIT),
            i32::from(ACTUATOR_LIMIT),
            self.min_angle,
            self.max_angle,
        )
    }

    /// Pulse width for an angle (μs)
    pub fn pulse_us(&self, angle: i32) -> u16 {
        let angle = angle.clamp(0, SERVO_TRAVEL_DEG);
        let pulse = map_range(
            angle,
            0,
            SERVO_TRAVEL_DEG,
            i32::from(self.min_pulse_us),
            i32::from(self.max_pulse_us),
        );
        pulse.clamp(0, i32::from(u16::MAX)) as u16
    }
}

/// Convert pulse width to PWM duty cycle
///
/// For 50 Hz PWM (20 ms period):
/// - 1000 μs = 5.0% duty cycle
/// - 1500 μs = 7.5% duty cycle
/// - 2000 μs = 10.0% duty cycle
pub fn pulse_to_duty_cycle(pulse_us: u16) -> f32 {
    f32::from(pulse_us) / f32::from(SERVO_PERIOD_US)
}

pub struct ServoActuator<P: PwmPin> {
    pin: P,
    config: ServoConfig,
    value: i16,
}

impl<P: PwmPin> ServoActuator<P> {
    pub fn new(pin: P, config: ServoConfig) -> Self {
        Self {
            pin,
            config,
            value: 0,
        }
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}

impl<P: PwmPin> ActuatorPort for ServoActuator<P> {
    fn init(&mut self) -> Result<(), ActuatorError> {
        self.set(0)
    }

    fn set(&mut self, value: i16) -> Result<(), ActuatorError> {
        let value = value.clamp(-ACTUATOR_LIMIT, ACTUATOR_LIMIT);
        let pulse = self.config.pulse_us(self.config.angle(value));
        self.pin.set_duty(pulse_to_duty_cycle(pulse))?;
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

    #[test]
    fn test_pulse_to_duty_cycle() {
        assert!((pulse_to_duty_cycle(1000) - 0.05).abs() < 0.0001);
        assert!((pulse_to_duty_cycle(1500) - 0.075).abs() < 0.0001);
        assert!((pulse_to_duty_cycle(2000) - 0.10).abs() < 0.0001);
    }

    #[test]
    fn setpoint_to_angle_and_pulse() {
        let config = ServoConfig::default();
        assert_eq!(config.angle(-1000), 0);
        assert_eq!(config.angle(0), 90);
        assert_eq!(config.angle(1000), 180);
        assert_eq!(config.pulse_us(0), 1000);
        assert_eq!(config.pulse_us(90), 1500);
        assert_eq!(config.pulse_us(180), 2000);
    }

    #[test]
    fn limited_angle_range() {
        let config = ServoConfig {
            min_angle: 45,
            max_angle: 135,
            ..ServoConfig::default()
        };
        assert_eq!(config.angle(-1000), 45);
        assert_eq!(config.angle(1000), 135);
        assert_eq!(config.pulse_us(config.angle(1000)), 1750);
    }

    #[test]
    fn init_centers_servo() {
        let mut servo = ServoActuator::new(MockPwmPin::default(), ServoConfig::default());
        servo.init().unwrap();
        assert_eq!(servo.value(), 0);
        assert!((servo.pin().duty - 0.075).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_setpoint_clamped() {
        let mut servo = ServoActuator::new(MockPwmPin::default(), ServoConfig::default());
        servo.set(5000).unwrap();
        assert_eq!(servo.value(), 1000);
        assert!((servo.pin().duty - 0.10).abs() < 1e-6);
    }

    #[test]
    fn pwm_fault_keeps_previous_value() {
        let mut servo = ServoActuator::new(MockPwmPin::default(), ServoConfig::default());
        servo.set(400).unwrap();
        servo.pin.fail = true;
        assert_eq!(servo.set(-400), Err(ActuatorError::HardwareFault));
        assert_eq!(servo.value(), 400);
    }
}
