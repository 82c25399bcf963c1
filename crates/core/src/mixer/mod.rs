//! Control mixers
//!
//! A mixer turns {pilot command, fused attitude} into per-channel
//! set-points. The variant is chosen once at startup from `FRAME_TYPE` and
//! held as a [`ControlMixer`]; the per-tick call is a plain `match`.
//!
//! # Variants
//!
//! - [`differential`]: Twin-motor boat, throttle ± yaw
//! - [`stabilized`]: Pitch-stabilized and bicopter (pitch + roll) PID mixers
//! - [`pid`]: Fixed-period PID axis controller used by the stabilized mixers

pub mod differential;
pub mod pid;
pub mod stabilized;

pub use differential::{differential_mix, DifferentialMixer};
pub use self::pid::{AxisController, PidGains};
pub use stabilized::{BicopterStabilizer, PitchStabilizer, StabilizerConfig};

use crate::actuator::{ActuatorError, ActuatorPort};
use crate::command::ControlCommand;
use crate::sensors::SensorSnapshot;

/// Vehicle kinematic layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameType {
    /// Twin-motor boat
    Differential = 0,
    /// Two motors plus pitch-stabilizing servo pair
    SingleAxis = 1,
    /// Tilt-servo bicopter, pitch and roll stabilized
    Bicopter = 2,
}

impl FrameType {
    /// Decode the `FRAME_TYPE` parameter
    pub fn from_param(value: i32) -> Option<Self> {
        match value {
            0 => Some(FrameType::Differential),
            1 => Some(FrameType::SingleAxis),
            2 => Some(FrameType::Bicopter),
            _ => None,
        }
    }

    /// Whether the layout has a servo pair
    pub fn needs_servos(self) -> bool {
        !matches!(self, FrameType::Differential)
    }
}

/// Current set-points of all channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelValues {
    pub motors: [i16; 2],
    pub servos: Option<[i16; 2]>,
}

/// Mixer interface
pub trait Mixer {
    /// Bring all channels to their neutral state
    fn init(&mut self) -> Result<(), ActuatorError>;

    /// Apply a command
    ///
    /// With a missing input the set-points stay as they are; channel
    /// housekeeping (`tick`) still runs.
    fn update(
        &mut self,
        command: Option<&ControlCommand>,
        sensors: Option<&SensorSnapshot>,
        now_us: u64,
    );

    /// Force every channel to zero; valid at any time, including before `init`
    fn stop_all(&mut self);

    /// Current set-points
    fn channels(&self) -> ChannelValues;
}

/// Zero one channel, logging a write failure
pub(crate) fn stop_channel<A: ActuatorPort>(channel: &mut A) {
    if let Err(e) = channel.set(0) {
        crate::log_error!("stop failed: {}", e);
    }
}

/// Mixer selected at startup
pub enum ControlMixer<M: ActuatorPort, S: ActuatorPort> {
    Differential(DifferentialMixer<M>),
    SingleAxis(PitchStabilizer<M, S>),
    Bicopter(BicopterStabilizer<M, S>),
}

impl<M: ActuatorPort, S: ActuatorPort> ControlMixer<M, S> {
    /// Build the mixer for a frame layout
    ///
    /// # Errors
    ///
    /// Returns `ActuatorError::MissingChannel` when the layout needs servos
    /// and none were given. Servos given to a differential frame are dropped.
    pub fn for_frame(
        frame: FrameType,
        motors: [M; 2],
        servos: Option<[S; 2]>,
        config: &StabilizerConfig,
    ) -> Result<Self, ActuatorError> {
        match (frame, servos) {
            (FrameType::Differential, _) => {
                let [left, right] = motors;
                Ok(ControlMixer::Differential(DifferentialMixer::new(left, right)))
            }
            (FrameType::SingleAxis, Some(servos)) => Ok(ControlMixer::SingleAxis(
                PitchStabilizer::new(motors, servos, config),
            )),
            (FrameType::Bicopter, Some(servos)) => Ok(ControlMixer::Bicopter(
                BicopterStabilizer::new(motors, servos, config),
            )),
            (_, None) => Err(ActuatorError::MissingChannel),
        }
    }

    pub fn frame(&self) -> FrameType {
        match self {
            ControlMixer::Differential(_) => FrameType::Differential,
            ControlMixer::SingleAxis(_) => FrameType::SingleAxis,
            ControlMixer::Bicopter(_) => FrameType::Bicopter,
        }
    }
}

impl<M: ActuatorPort, S: ActuatorPort> Mixer for ControlMixer<M, S> {
    fn init(&mut self) -> Result<(), ActuatorError> {
        match self {
            ControlMixer::Differential(m) => m.init(),
            ControlMixer::SingleAxis(m) => m.init(),
            ControlMixer::Bicopter(m) => m.init(),
        }
    }

    fn update(
        &mut self,
        command: Option<&ControlCommand>,
        sensors: Option<&SensorSnapshot>,
        now_us: u64,
    ) {
        match self {
            ControlMixer::Differential(m) => m.update(command, sensors, now_us),
            ControlMixer::SingleAxis(m) => m.update(command, sensors, now_us),
            ControlMixer::Bicopter(m) => m.update(command, sensors, now_us),
        }
    }

    fn stop_all(&mut self) {
        match self {
            ControlMixer::Differential(m) => m.stop_all(),
            ControlMixer::SingleAxis(m) => m.stop_all(),
            ControlMixer::Bicopter(m) => m.stop_all(),
        }
    }

    fn channels(&self) -> ChannelValues {
        match self {
            ControlMixer::Differential(m) => m.channels(),
            ControlMixer::SingleAxis(m) => m.channels(),
            ControlMixer::Bicopter(m) => m.channels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::mock::MockActuator;

    type TestMixer = ControlMixer<MockActuator, MockActuator>;

    fn motors() -> [MockActuator; 2] {
        [MockActuator::holding(400), MockActuator::holding(-400)]
    }

    fn servos() -> [MockActuator; 2] {
        [MockActuator::holding(250), MockActuator::holding(-250)]
    }

    #[test]
    fn frame_from_param() {
        assert_eq!(FrameType::from_param(0), Some(FrameType::Differential));
        assert_eq!(FrameType::from_param(2), Some(FrameType::Bicopter));
        assert_eq!(FrameType::from_param(3), None);
    }

    #[test]
    fn stabilized_frame_requires_servos() {
        let result = TestMixer::for_frame(
            FrameType::Bicopter,
            motors(),
            None,
            &StabilizerConfig::default(),
        );
        assert!(matches!(result, Err(ActuatorError::MissingChannel)));
    }

    #[test]
    fn stop_all_on_every_variant() {
        for frame in [
            FrameType::Differential,
            FrameType::SingleAxis,
            FrameType::Bicopter,
        ] {
            let mut mixer = TestMixer::for_frame(
                frame,
                motors(),
                Some(servos()),
                &StabilizerConfig::default(),
            )
            .unwrap();
            assert_eq!(mixer.frame(), frame);

            mixer.stop_all();
            let channels = mixer.channels();
            assert_eq!(channels.motors, [0, 0]);
            if let Some(servos) = channels.servos {
                assert_eq!(servos, [0, 0]);
            }
        }
    }

    #[test]
    fn dispatches_update() {
        let mut mixer = TestMixer::for_frame(
            FrameType::Differential,
            motors(),
            None,
            &StabilizerConfig::default(),
        )
        .unwrap();
        mixer.update(Some(&ControlCommand::new(-600, 500, 0, 0)), None, 0);
        assert_eq!(mixer.channels().motors, [-100, -1000]);
    }
}
