//! Stabilizer tuning parameters
//!
//! # Parameters
//!
//! - `STAB_PIT_P`, `STAB_PIT_I`, `STAB_PIT_D` - Pitch axis gains (per second)
//! - `STAB_ROL_P`, `STAB_ROL_I`, `STAB_ROL_D` - Roll axis gains (per second)
//! - `STAB_PERIOD_MS` - Controller sample period (ms)
//! - `STAB_SRV_MAX` - Servo deflection clamp (0..1000)
//! - `STAB_THR_MAX` - Differential thrust clamp (0..1000)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::actuator::ACTUATOR_LIMIT;
use crate::mixer::{PidGains, StabilizerConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerParams {
    pub config: StabilizerConfig,
}

const GAIN_NAMES: [(&str, &str, &str); 2] = [
    ("STAB_PIT_P", "STAB_PIT_I", "STAB_PIT_D"),
    ("STAB_ROL_P", "STAB_ROL_I", "STAB_ROL_D"),
];

impl StabilizerParams {
    /// Register stabilizer parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let d = StabilizerConfig::default();
        for ((p, i, dn), gains) in GAIN_NAMES.iter().zip([d.pitch, d.roll]) {
            store.register(p, ParamValue::Float(gains.kp), ParamFlags::empty())?;
            store.register(i, ParamValue::Float(gains.ki), ParamFlags::empty())?;
            store.register(dn, ParamValue::Float(gains.kd), ParamFlags::empty())?;
        }
        store.register(
            "STAB_PERIOD_MS",
            ParamValue::Int((d.period_us / 1_000) as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "STAB_SRV_MAX",
            ParamValue::Int(i32::from(d.servo_limit)),
            ParamFlags::empty(),
        )?;
        store.register(
            "STAB_THR_MAX",
            ParamValue::Int(i32::from(d.thrust_limit)),
            ParamFlags::empty(),
        )?;
        Ok(())
    }

    /// Load stabilizer parameters
    ///
    /// Negative gains, a zero period and clamps outside 0..1000 fall back
    /// to defaults.
    pub fn from_store(store: &ParameterStore) -> Self {
        let d = StabilizerConfig::default();

        let gains = |(p, i, dn): (&str, &str, &str), fallback: PidGains| {
            let gain = |name: &str, default: f32| {
                let v = store.get_f32_or(name, default);
                if v.is_finite() && v >= 0.0 {
                    v
                } else {
                    crate::log_warn!("{} invalid, using default", name);
                    default
                }
            };
            PidGains::new(
                gain(p, fallback.kp),
                gain(i, fallback.ki),
                gain(dn, fallback.kd),
            )
        };

        let period_ms = store.get_i32_or("STAB_PERIOD_MS", (d.period_us / 1_000) as i32);
        let period_us = u64::try_from(period_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map_or(d.period_us, |ms| ms * 1_000);

        let limit = |name: &str, default: i16| {
            let v = store.get_i32_or(name, i32::from(default));
            if (0..=i32::from(ACTUATOR_LIMIT)).contains(&v) {
                v as i16
            } else {
                crate::log_warn!("{} out of range, using default", name);
                default
            }
        };

        Self {
            config: StabilizerConfig {
                pitch: gains(GAIN_NAMES[0], d.pitch),
                roll: gains(GAIN_NAMES[1], d.roll),
                period_us,
                servo_limit: limit("STAB_SRV_MAX", d.servo_limit),
                thrust_limit: limit("STAB_THR_MAX", d.thrust_limit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_store() {
        let mut store = ParameterStore::new();
        StabilizerParams::register_defaults(&mut store).unwrap();
        assert_eq!(store.count(), 9);

        let params = StabilizerParams::from_store(&store);
        assert_eq!(params.config, StabilizerConfig::default());
    }

    #[test]
    fn test_custom_gains() {
        let mut store = ParameterStore::new();
        StabilizerParams::register_defaults(&mut store).unwrap();
        store.set("STAB_ROL_P", ParamValue::Float(4.5)).unwrap();
        store.set("STAB_PERIOD_MS", ParamValue::Int(20)).unwrap();
        store.set("STAB_THR_MAX", ParamValue::Int(500)).unwrap();

        let config = StabilizerParams::from_store(&store).config;
        assert_eq!(config.roll.kp, 4.5);
        assert_eq!(config.pitch, StabilizerConfig::default().pitch);
        assert_eq!(config.period_us, 20_000);
        assert_eq!(config.thrust_limit, 500);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let mut store = ParameterStore::new();
        StabilizerParams::register_defaults(&mut store).unwrap();
        store.set("STAB_PIT_I", ParamValue::Float(-1.0)).unwrap();
        store.set("STAB_PERIOD_MS", ParamValue::Int(0)).unwrap();
        store.set("STAB_SRV_MAX", ParamValue::Int(5000)).unwrap();

        let d = StabilizerConfig::default();
        let config = StabilizerParams::from_store(&store).config;
        assert_eq!(config.pitch.ki, d.pitch.ki);
        assert_eq!(config.period_us, d.period_us);
        assert_eq!(config.servo_limit, d.servo_limit);
    }
}
