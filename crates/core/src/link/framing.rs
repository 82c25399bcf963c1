//! Serial byte-stream framing
//!
//! On the serial link every control frame is preceded by two sentinel
//! bytes:
//!
//! ```text
//! ┌──────┬──────┬──────────────────────────────┐
//! │ 0x44 │ 0x43 │ 8-byte control frame         │
//! │ 'D'  │ 'C'  │ throttle, yaw, pitch, roll   │
//! └──────┴──────┴──────────────────────────────┘
//! ```
//!
//! Telemetry going the other way uses the same sentinels followed by the
//! snapshot. The framer is fed one byte at a time; bytes that cannot start
//! or continue a header are dropped until the stream is back in sync.

use crate::command::{ControlCommand, COMMAND_WIRE_SIZE};
use crate::sensors::{SensorSnapshot, TELEMETRY_WIRE_SIZE};

/// Sentinel bytes preceding every serial frame
pub const SERIAL_HEADER: [u8; 2] = [0x44, 0x43];

/// Control frame size on the serial link, header included
pub const SERIAL_FRAME_SIZE: usize = SERIAL_HEADER.len() + COMMAND_WIRE_SIZE;

/// Telemetry frame size on the serial link, header included
pub const SERIAL_TELEMETRY_SIZE: usize = SERIAL_HEADER.len() + TELEMETRY_WIRE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum FramerState {
    /// Waiting for the first sentinel
    SeekFirst,
    /// First sentinel seen, waiting for the second
    SeekSecond,
    /// Header complete, collecting payload bytes
    Payload { len: usize },
}

/// Incremental decoder for the serial control stream
#[derive(Debug)]
pub struct SerialFramer {
    state: FramerState,
    payload: [u8; COMMAND_WIRE_SIZE],
    dropped: u32,
}

impl SerialFramer {
    pub const fn new() -> Self {
        Self {
            state: FramerState::SeekFirst,
            payload: [0; COMMAND_WIRE_SIZE],
            dropped: 0,
        }
    }

    /// Feed one byte; returns a command when a frame completes
    pub fn push(&mut self, byte: u8) -> Option<ControlCommand> {
        match self.state {
            FramerState::SeekFirst => {
                if byte == SERIAL_HEADER[0] {
                    self.state = FramerState::SeekSecond;
                } else {
                    self.dropped = self.dropped.saturating_add(1);
                }
                None
            }
            FramerState::SeekSecond => {
                if byte == SERIAL_HEADER[1] {
                    self.state = FramerState::Payload { len: 0 };
                } else if byte == SERIAL_HEADER[0] {
                    // The earlier 'D' was noise; this one may start a frame
                    self.dropped = self.dropped.saturating_add(1);
                } else {
                    self.dropped = self.dropped.saturating_add(2);
                    self.state = FramerState::SeekFirst;
                }
                None
            }
            FramerState::Payload { len } => {
                self.payload[len] = byte;
                let len = len + 1;
                if len == COMMAND_WIRE_SIZE {
                    self.state = FramerState::SeekFirst;
                    ControlCommand::from_bytes(&self.payload)
                } else {
                    self.state = FramerState::Payload { len };
                    None
                }
            }
        }
    }

    /// Bytes discarded while searching for a header
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Whether a partial frame is buffered
    pub fn in_frame(&self) -> bool {
        self.state != FramerState::SeekFirst
    }

    /// Forget any partial frame
    pub fn reset(&mut self) {
        self.state = FramerState::SeekFirst;
    }
}

impl Default for SerialFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a control frame for the serial link
pub fn encode_command(command: &ControlCommand) -> [u8; SERIAL_FRAME_SIZE] {
    let mut out = [0u8; SERIAL_FRAME_SIZE];
    out[..2].copy_from_slice(&SERIAL_HEADER);
    out[2..].copy_from_slice(&command.to_bytes());
    out
}

/// Encode a telemetry frame for the serial link
pub fn encode_telemetry(snapshot: &SensorSnapshot) -> [u8; SERIAL_TELEMETRY_SIZE] {
    let mut out = [0u8; SERIAL_TELEMETRY_SIZE];
    out[..2].copy_from_slice(&SERIAL_HEADER);
    out[2..].copy_from_slice(&snapshot.to_bytes());
    out
}
