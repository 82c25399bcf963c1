//! Control frame wire format
//!
//! A control frame is exactly [`COMMAND_WIRE_SIZE`] bytes: four
//! little-endian `i16` fields in the order throttle, yaw, pitch, roll.
//! Datagram transports (UDP, ESP-NOW) carry it bare; the serial transport
//! prefixes two sentinel bytes (see [`crate::link::framing`]).
//!
//! Field ranges depend on the vehicle:
//! - Differential drive: all fields in `-1000..=1000`
//! - Stabilized frames: `pitch`/`roll` are attitude setpoints in
//!   centi-degrees (`-9000..=9000`)

/// Size of an encoded [`ControlCommand`] in bytes
pub const COMMAND_WIRE_SIZE: usize = 8;

/// Full-scale value for throttle/yaw and actuator set-points
pub const COMMAND_LIMIT: i16 = 1000;

/// Full-scale attitude setpoint (centi-degrees)
pub const SETPOINT_LIMIT_CDEG: i16 = 9000;

/// Pilot intent snapshot
///
/// Produced only by the link supervisor from a frame of exactly
/// [`COMMAND_WIRE_SIZE`] bytes and replaced wholesale on every valid frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlCommand {
    /// Forward thrust
    pub throttle: i16,
    /// Turn rate / heading demand
    pub yaw: i16,
    /// Pitch demand (centi-degrees on stabilized frames)
    pub pitch: i16,
    /// Roll demand (centi-degrees on stabilized frames)
    pub roll: i16,
}

impl ControlCommand {
    /// Create a command from its four axes
    pub const fn new(throttle: i16, yaw: i16, pitch: i16, roll: i16) -> Self {
        Self {
            throttle,
            yaw,
            pitch,
            roll,
        }
    }

    /// Decode a control frame
    ///
    /// Returns `None` unless `bytes` is exactly [`COMMAND_WIRE_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let frame: &[u8; COMMAND_WIRE_SIZE] = bytes.try_into().ok()?;
        Some(Self {
            throttle: i16::from_le_bytes([frame[0], frame[1]]),
            yaw: i16::from_le_bytes([frame[2], frame[3]]),
            pitch: i16::from_le_bytes([frame[4], frame[5]]),
            roll: i16::from_le_bytes([frame[6], frame[7]]),
        })
    }

    /// Encode as a control frame
    pub fn to_bytes(&self) -> [u8; COMMAND_WIRE_SIZE] {
        let mut out = [0u8; COMMAND_WIRE_SIZE];
        out[0..2].copy_from_slice(&self.throttle.to_le_bytes());
        out[2..4].copy_from_slice(&self.yaw.to_le_bytes());
        out[4..6].copy_from_slice(&self.pitch.to_le_bytes());
        out[6..8].copy_from_slice(&self.roll.to_le_bytes());
        out
    }

    /// Pitch setpoint in degrees
    pub fn pitch_deg(&self) -> f32 {
        self.pitch as f32 / 100.0
    }

    /// Roll setpoint in degrees
    pub fn roll_deg(&self) -> f32 {
        self.roll as f32 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_little_endian_field_order() {
        let frame = [0x58, 0x02, 0xF4, 0x01, 0x18, 0xFC, 0x00, 0x00];
        let cmd = ControlCommand::from_bytes(&frame).unwrap();
        assert_eq!(cmd, ControlCommand::new(600, 500, -1000, 0));
    }

    #[test]
    fn round_trip_extremes() {
        for cmd in [
            ControlCommand::new(i16::MIN, i16::MAX, -1, 1),
            ControlCommand::new(1000, -1000, SETPOINT_LIMIT_CDEG, -SETPOINT_LIMIT_CDEG),
            ControlCommand::default(),
        ] {
            assert_eq!(ControlCommand::from_bytes(&cmd.to_bytes()), Some(cmd));
        }
    }

    #[test]
    fn reject_wrong_length() {
        assert!(ControlCommand::from_bytes(&[]).is_none());
        assert!(ControlCommand::from_bytes(&[0u8; 7]).is_none());
        assert!(ControlCommand::from_bytes(&[0u8; 9]).is_none());
        assert!(ControlCommand::from_bytes(&[0u8; 10]).is_none());
    }

    #[test]
    fn setpoints_in_degrees() {
        let cmd = ControlCommand::new(0, 0, 1250, -300);
        assert!((cmd.pitch_deg() - 12.5).abs() < 1e-6);
        assert!((cmd.roll_deg() + 3.0).abs() < 1e-6);
    }
}
