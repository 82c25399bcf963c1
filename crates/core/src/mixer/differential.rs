//! Differential-drive mixer (twin-motor boat)
//!
//! `left = throttle + yaw`, `right = throttle - yaw`, each clamped to the
//! channel limit. Stateless apart from the channels themselves.

use super::{stop_channel, ChannelValues, Mixer};
use crate::actuator::{ActuatorError, ActuatorPort, ACTUATOR_LIMIT};
use crate::command::ControlCommand;
use crate::sensors::SensorSnapshot;

/// Mix throttle and yaw into left/right set-points
///
/// The sum is formed in `i32`, so extreme inputs clamp instead of wrapping.
pub fn differential_mix(throttle: i16, yaw: i16, limit: i16) -> (i16, i16) {
    let limit = i32::from(limit).abs().min(i32::from(i16::MAX));
    let throttle = i32::from(throttle);
    let yaw = i32::from(yaw);
    let left = (throttle + yaw).clamp(-limit, limit);
    let right = (throttle - yaw).clamp(-limit, limit);
    (left as i16, right as i16)
}

pub struct DifferentialMixer<M: ActuatorPort> {
    left: M,
    right: M,
    limit: i16,
}

impl<M: ActuatorPort> DifferentialMixer<M> {
    pub fn new(left: M, right: M) -> Self {
        Self {
            left,
            right,
            limit: ACTUATOR_LIMIT,
        }
    }

    pub fn left(&self) -> &M {
        &self.left
    }

    pub fn right(&self) -> &M {
        &self.right
    }
}

impl<M: ActuatorPort> Mixer for DifferentialMixer<M> {
    fn init(&mut self) -> Result<(), ActuatorError> {
        self.left.init()?;
        self.right.init()
    }

    fn update(
        &mut self,
        command: Option<&ControlCommand>,
        _sensors: Option<&SensorSnapshot>,
        now_us: u64,
    ) {
        if let Some(command) = command {
            let (left, right) = differential_mix(command.throttle, command.yaw, self.limit);
            if let Err(e) = self.left.set(left) {
                crate::log_warn!("left motor: {}", e);
            }
            if let Err(e) = self.right.set(right) {
                crate::log_warn!("right motor: {}", e);
            }
        }
        self.left.tick(now_us);
        self.right.tick(now_us);
    }

    fn stop_all(&mut self) {
        stop_channel(&mut self.left);
        stop_channel(&mut self.right);
    }

    fn channels(&self) -> ChannelValues {
        ChannelValues {
            motors: [self.left.value(), self.right.value()],
            servos: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::mock::MockActuator;

    #[test]
    fn mix_clamps_each_side() {
        assert_eq!(differential_mix(600, 500, 1000), (1000, 100));
        assert_eq!(differential_mix(-600, 500, 1000), (-100, -1000));
        assert_eq!(differential_mix(0, 0, 1000), (0, 0));
        assert_eq!(differential_mix(i16::MAX, i16::MAX, 1000), (1000, 0));
        assert_eq!(differential_mix(i16::MIN, i16::MAX, 1000), (-1, -1000));
    }

    #[test]
    fn update_drives_channels() {
        let mut mixer = DifferentialMixer::new(MockActuator::default(), MockActuator::default());
        mixer.init().unwrap();
        mixer.update(Some(&ControlCommand::new(600, 500, 0, 0)), None, 0);
        assert_eq!(mixer.channels().motors, [1000, 100]);
        assert_eq!(mixer.left().ticks, 1);
    }

    #[test]
    fn missing_command_leaves_outputs() {
        let mut mixer = DifferentialMixer::new(MockActuator::default(), MockActuator::default());
        mixer.update(Some(&ControlCommand::new(300, 0, 0, 0)), None, 0);
        mixer.update(None, None, 10_000);
        assert_eq!(mixer.channels().motors, [300, 300]);
    }

    #[test]
    fn stop_all_before_init() {
        let mut mixer =
            DifferentialMixer::new(MockActuator::holding(700), MockActuator::holding(-250));
        mixer.stop_all();
        assert_eq!(mixer.channels().motors, [0, 0]);
        assert_eq!(mixer.left().inits, 0);
    }
}
