//! Battery voltage monitor
//!
//! Reads a 12-bit ADC behind a resistor divider. The full-scale voltage
//! (`BATT_MAX_V`) is the battery voltage that produces a raw reading of
//! [`ADC_FULL_SCALE`].

use super::{Sensor, SensorError, SensorSnapshot, SensorStatus};

/// Raw value at the top of the ADC range
pub const ADC_FULL_SCALE: u16 = 4095;

/// Battery voltage at [`ADC_FULL_SCALE`]
pub const DEFAULT_FULL_SCALE_V: f32 = 25.0;

/// Time between ADC reads
pub const DEFAULT_READ_INTERVAL_US: u64 = 1_000_000;

/// Analog input collaborator
pub trait AdcPort {
    fn init(&mut self) -> Result<(), SensorError>;

    /// Raw conversion result (0..=4095)
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

/// Convert a raw reading to volts
pub fn raw_to_volts(raw: u16, full_scale_v: f32) -> f32 {
    f32::from(raw.min(ADC_FULL_SCALE)) / f32::from(ADC_FULL_SCALE) * full_scale_v
}

pub struct BatteryMonitor<A: AdcPort> {
    adc: A,
    full_scale_v: f32,
    read_interval_us: u64,
    ready: bool,
    last_read_us: Option<u64>,
    voltage: Option<f32>,
}

impl<A: AdcPort> BatteryMonitor<A> {
    pub fn new(adc: A) -> Self {
        Self::with_scale(adc, DEFAULT_FULL_SCALE_V, DEFAULT_READ_INTERVAL_US)
    }

    pub fn with_scale(adc: A, full_scale_v: f32, read_interval_us: u64) -> Self {
        Self {
            adc,
            full_scale_v,
            read_interval_us,
            ready: false,
            last_read_us: None,
            voltage: None,
        }
    }

    /// Last measured voltage
    pub fn voltage(&self) -> Option<f32> {
        self.voltage
    }
}

impl<A: AdcPort> Sensor for BatteryMonitor<A> {
    fn init(&mut self, _now_us: u64) -> Result<(), SensorError> {
        self.ready = false;
        self.adc.init()?;
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

        match self.adc.read_raw() {
            Ok(raw) => {
                let volts = raw_to_volts(raw, self.full_scale_v);
                self.voltage = Some(volts);
                snapshot.voltage = (volts * 100.0) as i16;
                SensorStatus::Updated
            }
            Err(e) => {
                crate::log_debug!("battery read failed: {}", e);
                SensorStatus::ReadFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAdc {
        raw: Result<u16, SensorError>,
        reads: u32,
    }

    impl AdcPort for FixedAdc {
        fn init(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn read_raw(&mut self) -> Result<u16, SensorError> {
            self.reads += 1;
            self.raw
        }
    }

    #[test]
    fn full_scale_is_25_volts() {
        assert!((raw_to_volts(4095, 25.0) - 25.0).abs() < 1e-4);
        assert!((raw_to_volts(2048, 25.0) - 12.503).abs() < 1e-2);
        assert_eq!(raw_to_volts(0, 25.0), 0.0);
        // Out-of-range raw clamps to full scale
        assert!((raw_to_volts(u16::MAX, 25.0) - 25.0).abs() < 1e-4);
    }

    #[test]
    fn reads_once_per_interval() {
        let adc = FixedAdc { raw: Ok(2048), reads: 0 };
        let mut battery = BatteryMonitor::new(adc);
        let mut snapshot = SensorSnapshot::new();
        battery.init(0).unwrap();

        assert_eq!(battery.update(0, &mut snapshot), SensorStatus::Updated);
        assert_eq!(snapshot.voltage, 1250);
        assert_eq!(battery.update(999_999, &mut snapshot), SensorStatus::NoNewData);
        assert_eq!(battery.update(1_000_000, &mut snapshot), SensorStatus::Updated);
        assert_eq!(battery.adc.reads, 2);
    }

    #[test]
    fn failed_read_holds_last_value() {
        let adc = FixedAdc { raw: Ok(4095), reads: 0 };
        let mut battery = BatteryMonitor::new(adc);
        let mut snapshot = SensorSnapshot::new();
        battery.init(0).unwrap();
        battery.update(0, &mut snapshot);
        assert_eq!(snapshot.voltage, 2500);

        battery.adc.raw = Err(SensorError::Bus);
        assert_eq!(battery.update(1_000_000, &mut snapshot), SensorStatus::ReadFailed);
        assert_eq!(snapshot.voltage, 2500);
    }

    #[test]
    fn not_ready_before_init() {
        let adc = FixedAdc { raw: Ok(100), reads: 0 };
        let mut battery = BatteryMonitor::new(adc);
        let mut snapshot = SensorSnapshot::new();
        assert_eq!(battery.update(0, &mut snapshot), SensorStatus::NotReady);
        assert_eq!(snapshot.voltage, 0);
    }
}
