//! Sensor hub: the attitude sensor plus an ordered list of auxiliary sensors
//!
//! All sensors write into one [`SensorSnapshot`] owned by the hub. The
//! control loop only sees the [`SensorSuite`] trait, so tests can swap in a
//! scripted suite.

use heapless::Vec;

use super::{AttitudeSensor, ImuPort, Sensor, SensorError, SensorSnapshot, SensorStatus};

/// What the control loop needs from the sensor side
pub trait SensorSuite {
    /// Initialize every sensor
    ///
    /// Every sensor is attempted; the first error is returned. Sensors that
    /// failed stay not-ready and hold their snapshot fields.
    fn init(&mut self, now_us: u64) -> Result<(), SensorError>;

    /// Refresh all sensors that are due
    fn update(&mut self, now_us: u64);

    /// Current snapshot, including fields that were never written
    fn snapshot(&self) -> &SensorSnapshot;

    /// Snapshot usable as a process variable (an attitude estimate exists)
    fn valid_snapshot(&self) -> Option<&SensorSnapshot>;
}

pub struct SensorHub<'a, I: ImuPort, const N: usize> {
    attitude: AttitudeSensor<I>,
    sensors: Vec<&'a mut dyn Sensor, N>,
    snapshot: SensorSnapshot,
    attitude_updates: u32,
}

impl<'a, I: ImuPort, const N: usize> SensorHub<'a, I, N> {
    pub fn new(attitude: AttitudeSensor<I>) -> Self {
        Self {
            attitude,
            sensors: Vec::new(),
            snapshot: SensorSnapshot::new(),
            attitude_updates: 0,
        }
    }

    /// Append a sensor; updated after the attitude sensor, in insertion order
    ///
    /// Gives the sensor back when the hub is full.
    pub fn add(&mut self, sensor: &'a mut dyn Sensor) -> Result<(), &'a mut dyn Sensor> {
        self.sensors.push(sensor)
    }

    /// Number of sensors, counting the attitude sensor
    pub fn sensor_count(&self) -> usize {
        self.sensors.len() + 1
    }

    pub fn attitude(&self) -> &AttitudeSensor<I> {
        &self.attitude
    }

    pub fn attitude_mut(&mut self) -> &mut AttitudeSensor<I> {
        &mut self.attitude
    }

    /// Successful attitude updates since start
    pub fn attitude_updates(&self) -> u32 {
        self.attitude_updates
    }
}

impl<I: ImuPort, const N: usize> SensorSuite for SensorHub<'_, I, N> {
    fn init(&mut self, now_us: u64) -> Result<(), SensorError> {
        let mut first_error = self.attitude.init(now_us).err();

        for (index, sensor) in self.sensors.iter_mut().enumerate() {
            if let Err(e) = sensor.init(now_us) {
                crate::log_warn!("sensor {} init failed: {}", index, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn update(&mut self, now_us: u64) {
        if self.attitude.update(now_us, &mut self.snapshot) == SensorStatus::Updated {
            self.attitude_updates = self.attitude_updates.wrapping_add(1);
        }
        for sensor in self.sensors.iter_mut() {
            sensor.update(now_us, &mut self.snapshot);
        }
    }

    fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    fn valid_snapshot(&self) -> Option<&SensorSnapshot> {
        self.attitude.has_estimate().then_some(&self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::super::attitude::mock::MockImu;
    use super::super::battery::{AdcPort, BatteryMonitor};
    use super::super::FilterMode;
    use super::*;

    struct HalfAdc;

    impl AdcPort for HalfAdc {
        fn init(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn read_raw(&mut self) -> Result<u16, SensorError> {
            Ok(2048)
        }
    }

    struct DeadAdc;

    impl AdcPort for DeadAdc {
        fn init(&mut self) -> Result<(), SensorError> {
            Err(SensorError::NotFound)
        }

        fn read_raw(&mut self) -> Result<u16, SensorError> {
            Err(SensorError::Bus)
        }
    }

    #[test]
    fn updates_attitude_and_aux_sensors() {
        let mut battery = BatteryMonitor::new(HalfAdc);
        let mut hub: SensorHub<'_, MockImu, 4> =
            SensorHub::new(AttitudeSensor::new(MockImu::level(), FilterMode::default()));
        assert!(hub.add(&mut battery).is_ok());
        assert_eq!(hub.sensor_count(), 2);

        hub.init(0).unwrap();
        hub.update(10_000);

        assert_eq!(hub.attitude_updates(), 1);
        assert_eq!(hub.snapshot().voltage, 1250);
        assert!(hub.valid_snapshot().is_some());
    }

    #[test]
    fn missing_imu_has_no_valid_snapshot() {
        let mut hub: SensorHub<'_, MockImu, 2> =
            SensorHub::new(AttitudeSensor::new(MockImu::missing(), FilterMode::default()));

        assert_eq!(hub.init(0), Err(SensorError::NotFound));
        hub.update(10_000);
        assert!(hub.valid_snapshot().is_none());
        assert_eq!(hub.snapshot().pitch, 0);
    }

    #[test]
    fn failed_aux_sensor_does_not_block_others() {
        let mut dead = BatteryMonitor::new(DeadAdc);
        let mut hub: SensorHub<'_, MockImu, 2> =
            SensorHub::new(AttitudeSensor::new(MockImu::level(), FilterMode::default()));
        assert!(hub.add(&mut dead).is_ok());

        assert_eq!(hub.init(0), Err(SensorError::NotFound));
        hub.update(10_000);
        assert_eq!(hub.attitude_updates(), 1);
        assert!(hub.valid_snapshot().is_some());
    }

    #[test]
    fn full_hub_rejects_sensor() {
        let mut a = BatteryMonitor::new(HalfAdc);
        let mut b = BatteryMonitor::new(HalfAdc);
        let mut hub: SensorHub<'_, MockImu, 1> =
            SensorHub::new(AttitudeSensor::new(MockImu::level(), FilterMode::default()));
        assert!(hub.add(&mut a).is_ok());
        assert!(hub.add(&mut b).is_err());
    }
}
