//! Sensor drivers feeding the shared [`SensorSnapshot`]
//!
//! Each sensor refreshes its own fields of the snapshot at its own cadence.
//! A sensor that is not ready, or whose read failed, leaves its fields at
//! the last good value; nothing here ever writes a fabricated zero.
//!
//! # Sensors
//!
//! - [`attitude`]: IMU fusion (complementary or accelerometer low-pass)
//! - [`range`]: Ultrasonic time-of-flight sampler with interrupt latch
//! - [`battery`]: Voltage-divider battery monitor
//! - [`climate`]: Temperature/humidity into the auxiliary slots
//! - [`hub`]: Ordered sensor list driven by the control loop

pub mod attitude;
pub mod battery;
pub mod climate;
pub mod hub;
pub mod range;
pub mod snapshot;

pub use attitude::{AttitudeFilter, AttitudeSensor, FilterMode, ImuPort, ImuSample};
pub use battery::{AdcPort, BatteryMonitor};
pub use climate::{ClimatePort, ClimateReading, ClimateSensor};
pub use hub::{SensorHub, SensorSuite};
pub use range::{EchoLatch, RangeConfig, RangeSampler, RangeState, TriggerPin};
pub use snapshot::{SensorSnapshot, AUX_SLOTS, DISTANCE_SLOTS, TELEMETRY_WIRE_SIZE};

use core::fmt;

/// Sensor failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Device did not answer during initialization
    NotFound,
    /// Bus transaction failed
    Bus,
    /// Device answered with an unusable value (NaN, out of range)
    InvalidReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::NotFound => write!(f, "sensor not found"),
            SensorError::Bus => write!(f, "sensor bus error"),
            SensorError::InvalidReading => write!(f, "invalid sensor reading"),
        }
    }
}

/// Result of one sensor update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorStatus {
    /// New data was written into the snapshot
    Updated,
    /// Nothing due yet (cadence not elapsed, echo pending)
    NoNewData,
    /// Sensor never initialized; snapshot fields untouched
    NotReady,
    /// Read attempted and failed; last good value held
    ReadFailed,
}

/// A sensor that contributes fields to the snapshot
pub trait Sensor {
    /// Bring the device up
    ///
    /// Failure leaves the sensor in a not-ready state; later updates report
    /// [`SensorStatus::NotReady`].
    fn init(&mut self, now_us: u64) -> Result<(), SensorError>;

    /// Refresh this sensor's snapshot fields if due
    fn update(&mut self, now_us: u64, snapshot: &mut SensorSnapshot) -> SensorStatus;
}
