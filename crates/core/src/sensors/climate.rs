//! Temperature/humidity sensor (DHT11 class)
//!
//! Publishes into two consecutive auxiliary slots: temperature (°C × 100)
//! at `slot`, relative humidity (% × 100) at `slot + 1`. A slot pair that
//! would run past the end of the auxiliary array only gets temperature.

use super::{Sensor, SensorError, SensorSnapshot, SensorStatus, AUX_SLOTS};

/// Time between reads; the DHT11 cannot be sampled faster
pub const DEFAULT_READ_INTERVAL_US: u64 = 2_000_000;

/// Climate reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Sensor driver collaborator
pub trait ClimatePort {
    fn init(&mut self) -> Result<(), SensorError>;

    /// Either value may be NaN when the device checksum failed
    fn read(&mut self) -> Result<ClimateReading, SensorError>;
}

pub struct ClimateSensor<C: ClimatePort> {
    port: C,
    slot: usize,
    read_interval_us: u64,
    ready: bool,
    last_read_us: Option<u64>,
}

impl<C: ClimatePort> ClimateSensor<C> {
    pub fn new(port: C, slot: usize) -> Self {
        Self {
            port,
            slot,
            read_interval_us: DEFAULT_READ_INTERVAL_US,
            ready: false,
            last_read_us: None,
        }
    }
}

fn centi(value: f32) -> i16 {
    (value * 100.0) as i16
}

impl<C: ClimatePort> Sensor for ClimateSensor<C> {
    fn init(&mut self, _now_us: u64) -> Result<(), SensorError> {
        self.ready = false;
        if self.slot >= AUX_SLOTS {
            return Err(SensorError::InvalidReading);
        }
        self.port.init()?;
        self.ready = true;
        Ok(())
    }

    fn update(&mut self, now_us: u64, snapshot: &mut SensorSnapshot) -> SensorStatus {
        if !self.ready {
            return SensorStatus::NotReady;
        }
        if let Some(last) = self.last_read_us {
            if now_us.saturating_sub(last) < self.read_interval_us {
                return SensorStatus::NoNewData;
            }
        }
        self.last_read_us = Some(now_us);

        let reading = match self.port.read() {
            Ok(reading) => reading,
            Err(e) => {
                crate::log_debug!("climate read failed: {}", e);
                return SensorStatus::ReadFailed;
            }
        };

        let mut written = false;
        if !reading.temperature_c.is_nan() {
            snapshot.aux[self.slot] = centi(reading.temperature_c);
            written = true;
        }
        if !reading.humidity_pct.is_nan() {
            if let Some(slot) = snapshot.aux.get_mut(self.slot + 1) {
                *slot = centi(reading.humidity_pct);
                written = true;
            }
        }

        if written {
            SensorStatus::Updated
        } else {
            SensorStatus::ReadFailed
        }
    }
}
