//! Fixed-point sensor snapshot and its telemetry encoding
//!
//! All values are scaled integers:
//! - `pitch`, `roll`: hundredths of a degree
//! - `linear_accel`: hundredths of m/s² (gravity removed)
//! - `voltage`: hundredths of a volt
//! - `distance`: centimetres, one slot per range sensor
//! - `aux`: sensor-specific, hundredths of the natural unit
//!
//! Telemetry sends the snapshot as [`TELEMETRY_WIRE_SIZE`] little-endian
//! bytes in field order.

/// Number of range sensor slots
pub const DISTANCE_SLOTS: usize = 6;

/// Number of auxiliary value slots
pub const AUX_SLOTS: usize = 5;

/// Encoded snapshot size: 6 × i16 + 6 × u16 + 5 × i16
pub const TELEMETRY_WIRE_SIZE: usize = 2 * (6 + DISTANCE_SLOTS + AUX_SLOTS);

/// Latest sensor readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
    pub pitch: i16,
    pub roll: i16,
    pub linear_accel: [i16; 3],
    pub voltage: i16,
    pub distance: [u16; DISTANCE_SLOTS],
    pub aux: [i16; AUX_SLOTS],
}

impl SensorSnapshot {
    /// Empty snapshot
    pub const fn new() -> Self {
        Self {
            pitch: 0,
            roll: 0,
            linear_accel: [0; 3],
            voltage: 0,
            distance: [0; DISTANCE_SLOTS],
            aux: [0; AUX_SLOTS],
        }
    }

    /// Encode for a telemetry frame
    pub fn to_bytes(&self) -> [u8; TELEMETRY_WIRE_SIZE] {
        let mut out = [0u8; TELEMETRY_WIRE_SIZE];
        let mut words = out.chunks_exact_mut(2);

        let signed = [
            self.pitch,
            self.roll,
            self.linear_accel[0],
            self.linear_accel[1],
            self.linear_accel[2],
            self.voltage,
        ];
        // Shorter iterator first so zip never pulls a spare slot
        for (value, slot) in signed.into_iter().zip(words.by_ref()) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        for (value, slot) in self.distance.into_iter().zip(words.by_ref()) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        for (value, slot) in self.aux.into_iter().zip(words) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Decode a telemetry frame (ground-station side)
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != TELEMETRY_WIRE_SIZE {
            return None;
        }
        let word = |i: usize| [bytes[2 * i], bytes[2 * i + 1]];

        let mut snapshot = Self::new();
        snapshot.pitch = i16::from_le_bytes(word(0));
        snapshot.roll = i16::from_le_bytes(word(1));
        for axis in 0..3 {
            snapshot.linear_accel[axis] = i16::from_le_bytes(word(2 + axis));
        }
        snapshot.voltage = i16::from_le_bytes(word(5));
        for (i, d) in snapshot.distance.iter_mut().enumerate() {
            *d = u16::from_le_bytes(word(6 + i));
        }
        for (i, a) in snapshot.aux.iter_mut().enumerate() {
            *a = i16::from_le_bytes(word(6 + DISTANCE_SLOTS + i));
        }
        Some(snapshot)
    }

    /// Pitch in degrees
    pub fn pitch_deg(&self) -> f32 {
        self.pitch as f32 / 100.0
    }

    /// Roll in degrees
    pub fn roll_deg(&self) -> f32 {
        self.roll as f32 / 100.0
    }
}
