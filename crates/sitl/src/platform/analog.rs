//! Simulated battery ADC and climate sensor.

use wst_core::sensors::battery::ADC_FULL_SCALE;
use wst_core::sensors::{AdcPort, ClimatePort, ClimateReading, SensorError};

/// Battery voltage-divider ADC reporting a fixed voltage.
#[derive(Debug, Clone)]
pub struct SimAdc {
    raw: u16,
}

impl SimAdc {
    /// ADC reading for `volts` given the divider's full-scale voltage.
    pub fn with_voltage(volts: f32, full_scale_v: f32) -> Self {
        let fraction = (volts / full_scale_v).clamp(0.0, 1.0);
        Self {
            raw: (fraction * f32::from(ADC_FULL_SCALE)).round() as u16,
        }
    }

    pub fn set_raw(&mut self, raw: u16) {
        self.raw = raw;
    }

    pub fn raw(&self) -> u16 {
        self.raw
    }
}

impl AdcPort for SimAdc {
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read_raw(&mut self) -> Result<u16, SensorError> {
        Ok(self.raw)
    }
}

/// Temperature/humidity sensor with a settable reading.
#[derive(Debug, Clone)]
pub struct SimClimate {
    reading: ClimateReading,
}

impl SimClimate {
    pub fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            reading: ClimateReading {
                temperature_c,
                humidity_pct,
            },
        }
    }

    pub fn set(&mut self, reading: ClimateReading) {
        self.reading = reading;
    }
}

impl ClimatePort for SimClimate {
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        Ok(self.reading)
    }
}
