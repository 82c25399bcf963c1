//! PID-stabilized mixers
//!
//! Both variants drive two motors and a mirrored servo pair. Setpoints come
//! from the command in centi-degrees; the process variable is the filtered
//! attitude from the snapshot.
//!
//! | Variant              | Servos (pitch)         | Motors                          |
//! |----------------------|------------------------|---------------------------------|
//! | [`PitchStabilizer`]  | `+pitch_out, -pitch_out` | `throttle ± yaw` (differential) |
//! | [`BicopterStabilizer`] | `+pitch_out, -pitch_out` | `throttle ± roll_out`          |
//!
//! Each axis runs on its own period gate; between boundaries the held
//! output is reused. Without both a command and a valid snapshot the
//! set-points are left exactly as they were.

use super::differential::differential_mix;
use super::pid::{AxisController, PidGains};
use super::{stop_channel, ChannelValues, Mixer};
use crate::actuator::{ActuatorError, ActuatorPort, ACTUATOR_LIMIT};
use crate::command::ControlCommand;
use crate::sensors::SensorSnapshot;

/// Stabilizer tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig {
    pub pitch: PidGains,
    pub roll: PidGains,
    /// Controller sample period
    pub period_us: u64,
    /// Servo deflection clamp (pitch axis)
    pub servo_limit: i16,
    /// Differential thrust clamp (roll axis)
    pub thrust_limit: i16,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            pitch: PidGains::new(15.0, 0.5, 1.0),
            roll: PidGains::new(8.0, 0.2, 0.5),
            period_us: 10_000,
            servo_limit: ACTUATOR_LIMIT,
            thrust_limit: 300,
        }
    }
}

fn to_setpoint(output: f32) -> i16 {
    let limit = f32::from(ACTUATOR_LIMIT);
    output.clamp(-limit, limit) as i16
}

/// Mirrored servo pair
struct ServoPair<S: ActuatorPort> {
    left: S,
    right: S,
}

impl<S: ActuatorPort> ServoPair<S> {
    fn init(&mut self) -> Result<(), ActuatorError> {
        self.left.init()?;
        self.right.init()
    }

    fn deflect(&mut self, output: f32) {
        let value = to_setpoint(output);
        if let Err(e) = self.left.set(value) {
            crate::log_warn!("left servo: {}", e);
        }
        if let Err(e) = self.right.set(-value) {
            crate::log_warn!("right servo: {}", e);
        }
    }

    fn tick(&mut self, now_us: u64) {
        self.left.tick(now_us);
        self.right.tick(now_us);
    }

    fn stop(&mut self) {
        stop_channel(&mut self.left);
        stop_channel(&mut self.right);
    }

    fn values(&self) -> [i16; 2] {
        [self.left.value(), self.right.value()]
    }
}

/// Motor pair
struct MotorPair<M: ActuatorPort> {
    left: M,
    right: M,
}

impl<M: ActuatorPort> MotorPair<M> {
    fn init(&mut self) -> Result<(), ActuatorError> {
        self.left.init()?;
        self.right.init()
    }

    fn drive(&mut self, (left, right): (i16, i16)) {
        if let Err(e) = self.left.set(left) {
            crate::log_warn!("left motor: {}", e);
        }
        if let Err(e) = self.right.set(right) {
            crate::log_warn!("right motor: {}", e);
        }
    }

    fn tick(&mut self, now_us: u64) {
        self.left.tick(now_us);
        self.right.tick(now_us);
    }

    fn stop(&mut self) {
        stop_channel(&mut self.left);
        stop_channel(&mut self.right);
    }

    fn values(&self) -> [i16; 2] {
        [self.left.value(), self.right.value()]
    }
}

/// Single-axis stabilizer: pitch held by the servos
pub struct PitchStabilizer<M: ActuatorPort, S: ActuatorPort> {
    motors: MotorPair<M>,
    servos: ServoPair<S>,
    pitch: AxisController,
}

impl<M: ActuatorPort, S: ActuatorPort> PitchStabilizer<M, S> {
    pub fn new(motors: [M; 2], servos: [S; 2], config: &StabilizerConfig) -> Self {
        let [motor_left, motor_right] = motors;
        let [servo_left, servo_right] = servos;
        Self {
            motors: MotorPair {
                left: motor_left,
                right: motor_right,
            },
            servos: ServoPair {
                left: servo_left,
                right: servo_right,
            },
            pitch: AxisController::new(
                config.pitch,
                f32::from(config.servo_limit),
                config.period_us,
            ),
        }
    }

    pub fn pitch_axis(&self) -> &AxisController {
        &self.pitch
    }
}

impl<M: ActuatorPort, S: ActuatorPort> Mixer for PitchStabilizer<M, S> {
    fn init(&mut self) -> Result<(), ActuatorError> {
        self.pitch.reset();
        self.motors.init()?;
        self.servos.init()
    }

    fn update(
        &mut self,
        command: Option<&ControlCommand>,
        sensors: Option<&SensorSnapshot>,
        now_us: u64,
    ) {
        if let (Some(command), Some(sensors)) = (command, sensors) {
            if let Some(out) = self
                .pitch
                .compute(command.pitch_deg(), sensors.pitch_deg(), now_us)
            {
                self.servos.deflect(out);
            }
            self.motors
                .drive(differential_mix(command.throttle, command.yaw, ACTUATOR_LIMIT));
        }
        self.motors.tick(now_us);
        self.servos.tick(now_us);
    }

    fn stop_all(&mut self) {
        self.motors.stop();
        self.servos.stop();
    }

    fn channels(&self) -> ChannelValues {
        ChannelValues {
            motors: self.motors.values(),
            servos: Some(self.servos.values()),
        }
    }
}

/// Dual-axis stabilizer: pitch by servos, roll by differential thrust
pub struct BicopterStabilizer<M: ActuatorPort, S: ActuatorPort> {
    motors: MotorPair<M>,
    servos: ServoPair<S>,
    pitch: AxisController,
    roll: AxisController,
}

impl<M: ActuatorPort, S: ActuatorPort> BicopterStabilizer<M, S> {
    pub fn new(motors: [M; 2], servos: [S; 2], config: &StabilizerConfig) -> Self {
        let [motor_left, motor_right] = motors;
        let [servo_left, servo_right] = servos;
        Self {
            motors: MotorPair {
                left: motor_left,
                right: motor_right,
            },
            servos: ServoPair {
                left: servo_left,
                right: servo_right,
            },
            pitch: AxisController::new(
                config.pitch,
                f32::from(config.servo_limit),
                config.period_us,
            ),
            roll: AxisController::new(
                config.roll,
                f32::from(config.thrust_limit),
                config.period_us,
            ),
        }
    }

    pub fn pitch_axis(&self) -> &AxisController {
        &self.pitch
    }

    pub fn roll_axis(&self) -> &AxisController {
        &self.roll
    }
}

impl<M: ActuatorPort, S: ActuatorPort> Mixer for BicopterStabilizer<M, S> {
    fn init(&mut self) -> Result<(), ActuatorError> {
        self.pitch.reset();
        self.roll.reset();
        self.motors.init()?;
        self.servos.init()
    }

    fn update(
        &mut self,
        command: Option<&ControlCommand>,
        sensors: Option<&SensorSnapshot>,
        now_us: u64,
    ) {
        if let (Some(command), Some(sensors)) = (command, sensors) {
            if let Some(out) = self
                .pitch
                .compute(command.pitch_deg(), sensors.pitch_deg(), now_us)
            {
                self.servos.deflect(out);
            }

            // Roll holds its last output between its own period boundaries
            self.roll
                .compute(command.roll_deg(), sensors.roll_deg(), now_us);
            let roll_out = to_setpoint(self.roll.output());
            self.motors
                .drive(differential_mix(command.throttle, roll_out, ACTUATOR_LIMIT));
        }
        self.motors.tick(now_us);
        self.servos.tick(now_us);
    }

    fn stop_all(&mut self) {
        self.motors.stop();
        self.servos.stop();
    }

    fn channels(&self) -> ChannelValues {
        ChannelValues {
            motors: self.motors.values(),
            servos: Some(self.servos.values()),
        }
    }
}
