//! Sensor parameters
//!
//! # Parameters
//!
//! - `AHRS_MODE` - 0 complementary (gyro + accel), 1 accelerometer low-pass
//! - `AHRS_GYRO_W` - Complementary filter gyro weight (0..1)
//! - `AHRS_ACC_ALPHA` - Accelerometer low-pass factor (0..1)
//! - `RNG_PING_MS` - Range sensor ping interval (ms)
//! - `RNG_TIMEOUT_MS` - Range echo timeout (ms)
//! - `BATT_READ_MS` - Battery sample interval (ms)
//! - `BATT_MAX_V` - Voltage at ADC full scale

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::sensors::attitude::{DEFAULT_ACCEL_ALPHA, DEFAULT_GYRO_WEIGHT};
use crate::sensors::battery::{DEFAULT_FULL_SCALE_V, DEFAULT_READ_INTERVAL_US};
use crate::sensors::range::{DEFAULT_ECHO_TIMEOUT_US, DEFAULT_PING_INTERVAL_US};
use crate::sensors::{FilterMode, RangeConfig};

const AHRS_MODE_COMPLEMENTARY: i32 = 0;
const AHRS_MODE_ACCEL: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorParams {
    pub filter: FilterMode,
    pub ping_interval_ms: u32,
    pub echo_timeout_ms: u32,
    pub battery_read_ms: u32,
    pub battery_full_scale_v: f32,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            filter: FilterMode::default(),
            ping_interval_ms: (DEFAULT_PING_INTERVAL_US / 1_000) as u32,
            echo_timeout_ms: (DEFAULT_ECHO_TIMEOUT_US / 1_000) as u32,
            battery_read_ms: (DEFAULT_READ_INTERVAL_US / 1_000) as u32,
            battery_full_scale_v: DEFAULT_FULL_SCALE_V,
        }
    }
}

fn unit_interval(store: &ParameterStore, name: &str, default: f32) -> f32 {
    let v = store.get_f32_or(name, default);
    if (0.0..=1.0).contains(&v) {
        v
    } else {
        crate::log_warn!("{} outside 0..1, using default", name);
        default
    }
}

fn positive_ms(store: &ParameterStore, name: &str, default: u32) -> u32 {
    u32::try_from(store.get_i32_or(name, default as i32))
        .ok()
        .filter(|ms| *ms > 0)
        .unwrap_or(default)
}

impl SensorParams {
    /// Register sensor parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let d = Self::default();
        store.register(
            "AHRS_MODE",
            ParamValue::Int(AHRS_MODE_COMPLEMENTARY),
            ParamFlags::empty(),
        )?;
        store.register(
            "AHRS_GYRO_W",
            ParamValue::Float(DEFAULT_GYRO_WEIGHT),
            ParamFlags::empty(),
        )?;
        store.register(
            "AHRS_ACC_ALPHA",
            ParamValue::Float(DEFAULT_ACCEL_ALPHA),
            ParamFlags::empty(),
        )?;
        store.register(
            "RNG_PING_MS",
            ParamValue::Int(d.ping_interval_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "RNG_TIMEOUT_MS",
            ParamValue::Int(d.echo_timeout_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "BATT_READ_MS",
            ParamValue::Int(d.battery_read_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "BATT_MAX_V",
            ParamValue::Float(d.battery_full_scale_v),
            ParamFlags::empty(),
        )?;
        Ok(())
    }

    /// Load sensor parameters with fallback to defaults
    pub fn from_store(store: &ParameterStore) -> Self {
        let d = Self::default();

        let filter = match store.get_i32_or("AHRS_MODE", AHRS_MODE_COMPLEMENTARY) {
            AHRS_MODE_ACCEL => FilterMode::AccelLowPass {
                alpha: unit_interval(store, "AHRS_ACC_ALPHA", DEFAULT_ACCEL_ALPHA),
            },
            mode => {
                if mode != AHRS_MODE_COMPLEMENTARY {
                    crate::log_warn!("AHRS_MODE {} unknown, using complementary", mode);
                }
                FilterMode::Complementary {
                    gyro_weight: unit_interval(store, "AHRS_GYRO_W", DEFAULT_GYRO_WEIGHT),
                }
            }
        };

        let full_scale = store.get_f32_or("BATT_MAX_V", d.battery_full_scale_v);
        let battery_full_scale_v = if full_scale.is_finite() && full_scale > 0.0 {
            full_scale
        } else {
            d.battery_full_scale_v
        };

        Self {
            filter,
            ping_interval_ms: positive_ms(store, "RNG_PING_MS", d.ping_interval_ms),
            echo_timeout_ms: positive_ms(store, "RNG_TIMEOUT_MS", d.echo_timeout_ms),
            battery_read_ms: positive_ms(store, "BATT_READ_MS", d.battery_read_ms),
            battery_full_scale_v,
        }
    }

    /// Range sampler configuration for a distance slot
    pub fn range_config(&self, slot: usize) -> RangeConfig {
        RangeConfig {
            slot,
            ping_interval_us: u64::from(self.ping_interval_ms) * 1_000,
            echo_timeout_us: u64::from(self.echo_timeout_ms) * 1_000,
        }
    }

    pub fn battery_read_interval_us(&self) -> u64 {
        u64::from(self.battery_read_ms) * 1_000
    }
}
