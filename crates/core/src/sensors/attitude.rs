//! Attitude estimation from an IMU
//!
//! Two estimators are supported, selected once from configuration:
//!
//! - **Complementary** (gyro + accelerometer, e.g. MPU6050):
//!   `est = w·(est + rate·Δt) + (1 − w)·accel_angle`
//! - **Accelerometer low-pass** (accelerometer only, e.g. ADXL345):
//!   `est = est·(1 − α) + accel_angle·α`
//!
//! Accelerometer angles use the gravity projection
//! `pitch = atan2(ay, az)`, `roll = atan2(−ax, az)`. Linear acceleration is
//! the raw accelerometer vector minus the gravity vector rebuilt from the
//! filtered attitude; it feeds telemetry only, never control.

use libm::{atan2f, cosf, sinf};

use super::{Sensor, SensorError, SensorSnapshot, SensorStatus};

/// Standard gravity used for gravity removal (m/s²)
pub const GRAVITY_MSS: f32 = 9.81;

/// Smallest Δt fed to the filter (seconds); guards clock wraparound
pub const MIN_DT_S: f32 = 1.0e-4;

/// Default gyro weight of the complementary filter
pub const DEFAULT_GYRO_WEIGHT: f32 = 0.96;

/// Default smoothing factor of the accelerometer-only filter
pub const DEFAULT_ACCEL_ALPHA: f32 = 0.2;

const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;
const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

/// Raw IMU reading in SI units (body frame)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuSample {
    /// Accelerometer [x, y, z] in m/s²
    pub accel_mss: [f32; 3],
    /// Gyroscope [x, y, z] in rad/s
    pub gyro_rads: [f32; 3],
}

/// IMU collaborator port (register access lives behind it)
pub trait ImuPort {
    /// Probe and configure the device
    fn init(&mut self) -> Result<(), SensorError>;

    /// Read one sample
    fn read(&mut self) -> Result<ImuSample, SensorError>;
}

/// Estimator selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterMode {
    /// Gyro integration blended with accelerometer angle
    Complementary { gyro_weight: f32 },
    /// Accelerometer angle through a first-order low-pass
    AccelLowPass { alpha: f32 },
}

impl Default for FilterMode {
    fn default() -> Self {
        FilterMode::Complementary {
            gyro_weight: DEFAULT_GYRO_WEIGHT,
        }
    }
}

/// Filtered attitude in floating point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attitude {
    pub pitch_deg: f32,
    pub roll_deg: f32,
    /// Gravity-compensated acceleration [x, y, z] in m/s²
    pub linear_accel_mss: [f32; 3],
}

impl Attitude {
    /// Write into the fixed-point snapshot fields
    pub fn store(&self, snapshot: &mut SensorSnapshot) {
        snapshot.pitch = to_centi(self.pitch_deg);
        snapshot.roll = to_centi(self.roll_deg);
        for (dst, src) in snapshot.linear_accel.iter_mut().zip(self.linear_accel_mss) {
            *dst = to_centi(src);
        }
    }
}

/// Float to hundredths, saturating at the i16 range
fn to_centi(value: f32) -> i16 {
    (value * 100.0) as i16
}

/// Pitch and roll implied by the gravity direction alone (degrees)
pub fn accel_angles(accel_mss: [f32; 3]) -> (f32, f32) {
    let [ax, ay, az] = accel_mss;
    let pitch = atan2f(ay, az) * RAD_TO_DEG;
    let roll = atan2f(-ax, az) * RAD_TO_DEG;
    (pitch, roll)
}

/// Remove the gravity vector predicted by `pitch_deg`/`roll_deg`
pub fn linear_acceleration(accel_mss: [f32; 3], pitch_deg: f32, roll_deg: f32) -> [f32; 3] {
    let pitch = pitch_deg * DEG_TO_RAD;
    let roll = roll_deg * DEG_TO_RAD;

    let gravity = [
        sinf(roll) * GRAVITY_MSS,
        sinf(pitch) * GRAVITY_MSS,
        cosf(roll) * cosf(pitch) * GRAVITY_MSS,
    ];

    [
        accel_mss[0] - gravity[0],
        accel_mss[1] - gravity[1],
        accel_mss[2] - gravity[2],
    ]
}

/// Pitch/roll estimator state
#[derive(Debug, Clone)]
pub struct AttitudeFilter {
    mode: FilterMode,
    pitch_deg: f32,
    roll_deg: f32,
    seeded: bool,
}

impl AttitudeFilter {
    /// Create an unseeded filter
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            pitch_deg: 0.0,
            roll_deg: 0.0,
            seeded: false,
        }
    }

    /// Start the estimate from the accelerometer angle
    pub fn seed(&mut self, accel_mss: [f32; 3]) {
        let (pitch, roll) = accel_angles(accel_mss);
        self.pitch_deg = pitch;
        self.roll_deg = roll;
        self.seeded = true;
    }

    /// Whether an estimate exists
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Fold in one sample taken `dt_s` seconds after the previous one
    ///
    /// Non-positive or non-finite `dt_s` is replaced by [`MIN_DT_S`]. The
    /// first call on an unseeded filter seeds it from the accelerometer.
    pub fn update(&mut self, sample: &ImuSample, dt_s: f32) -> Attitude {
        if !self.seeded {
            self.seed(sample.accel_mss);
        } else {
            let dt = if dt_s.is_finite() && dt_s > 0.0 {
                dt_s
            } else {
                MIN_DT_S
            };
            let (accel_pitch, accel_roll) = accel_angles(sample.accel_mss);

            match self.mode {
                FilterMode::Complementary { gyro_weight } => {
                    let pitch_rate = sample.gyro_rads[0] * RAD_TO_DEG;
                    let roll_rate = sample.gyro_rads[1] * RAD_TO_DEG;
                    self.pitch_deg = gyro_weight * (self.pitch_deg + pitch_rate * dt)
                        + (1.0 - gyro_weight) * accel_pitch;
                    self.roll_deg = gyro_weight * (self.roll_deg + roll_rate * dt)
                        + (1.0 - gyro_weight) * accel_roll;
                }
                FilterMode::AccelLowPass { alpha } => {
                    self.pitch_deg = self.pitch_deg * (1.0 - alpha) + accel_pitch * alpha;
                    self.roll_deg = self.roll_deg * (1.0 - alpha) + accel_roll * alpha;
                }
            }
        }

        self.attitude(sample.accel_mss)
    }

    fn attitude(&self, accel_mss: [f32; 3]) -> Attitude {
        Attitude {
            pitch_deg: self.pitch_deg,
            roll_deg: self.roll_deg,
            linear_accel_mss: linear_acceleration(accel_mss, self.pitch_deg, self.roll_deg),
        }
    }
}

/// IMU driver plus filter, publishing into the snapshot
pub struct AttitudeSensor<I: ImuPort> {
    imu: I,
    filter: AttitudeFilter,
    ready: bool,
    last_sample_us: u64,
    read_failures: u32,
}

impl<I: ImuPort> AttitudeSensor<I> {
    pub fn new(imu: I, mode: FilterMode) -> Self {
        Self {
            imu,
            filter: AttitudeFilter::new(mode),
            ready: false,
            last_sample_us: 0,
            read_failures: 0,
        }
    }

    /// IMU initialized successfully
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// At least one attitude estimate has been published
    pub fn has_estimate(&self) -> bool {
        self.filter.is_seeded()
    }

    /// Number of failed reads since start
    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }

    pub fn imu(&self) -> &I {
        &self.imu
    }

    pub fn imu_mut(&mut self) -> &mut I {
        &mut self.imu
    }
}

impl<I: ImuPort> Sensor for AttitudeSensor<I> {
    fn init(&mut self, now_us: u64) -> Result<(), SensorError> {
        if let Err(e) = self.imu.init() {
            crate::log_warn!("IMU not ready: {}", e);
            self.ready = false;
            return Err(e);
        }

        self.ready = true;
        self.last_sample_us = now_us;

        // Start from the gravity direction so the first estimate is not "level"
        match self.imu.read() {
            Ok(sample) => self.filter.seed(sample.accel_mss),
            Err(e) => crate::log_debug!("IMU seed read failed: {}", e),
        }
        crate::log_info!("IMU ready");
        Ok(())
    }

    fn update(&mut self, now_us: u64, snapshot: &mut SensorSnapshot) -> SensorStatus {
        if !self.ready {
            return SensorStatus::NotReady;
        }

        let sample = match self.imu.read() {
            Ok(sample) => sample,
            Err(e) => {
                self.read_failures = self.read_failures.saturating_add(1);
                crate::log_debug!("IMU read failed: {}", e);
                return SensorStatus::ReadFailed;
            }
        };

        // A clock that went backwards yields 0 here and MIN_DT_S in the filter
        let dt_s = now_us.saturating_sub(self.last_sample_us) as f32 / 1_000_000.0;
        self.last_sample_us = now_us;

        self.filter.update(&sample, dt_s).store(snapshot);
        SensorStatus::Updated
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    /// Scripted IMU
    pub struct MockImu {
        pub present: bool,
        pub sample: ImuSample,
        pub fail_reads: bool,
        pub reads: u32,
    }

    impl MockImu {
        pub fn level() -> Self {
            Self {
                present: true,
                sample: ImuSample {
                    accel_mss: [0.0, 0.0, GRAVITY_MSS],
                    gyro_rads: [0.0; 3],
                },
                fail_reads: false,
                reads: 0,
            }
        }

        pub fn missing() -> Self {
            Self {
                present: false,
                ..Self::level()
            }
        }
    }

    impl ImuPort for MockImu {
        fn init(&mut self) -> Result<(), SensorError> {
            if self.present {
                Ok(())
            } else {
                Err(SensorError::NotFound)
            }
        }

        fn read(&mut self) -> Result<ImuSample, SensorError> {
            self.reads += 1;
            if self.fail_reads {
                Err(SensorError::Bus)
            } else {
                Ok(self.sample)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockImu;
    use super::*;

    fn tilted(pitch_deg: f32) -> [f32; 3] {
        let rad = pitch_deg * DEG_TO_RAD;
        [0.0, sinf(rad) * GRAVITY_MSS, cosf(rad) * GRAVITY_MSS]
    }

    #[test]
    fn accel_angles_level_and_tilted() {
        let (pitch, roll) = accel_angles([0.0, 0.0, GRAVITY_MSS]);
        assert!(pitch.abs() < 1e-4);
        assert!(roll.abs() < 1e-4);

        let (pitch, _) = accel_angles(tilted(30.0));
        assert!((pitch - 30.0).abs() < 1e-3);

        let (_, roll) = accel_angles([-GRAVITY_MSS, 0.0, GRAVITY_MSS]);
        assert!((roll - 45.0).abs() < 1e-3);
    }

    #[test]
    fn first_update_seeds_from_accelerometer() {
        let mut filter = AttitudeFilter::new(FilterMode::default());
        let sample = ImuSample {
            accel_mss: tilted(20.0),
            gyro_rads: [0.0; 3],
        };
        let attitude = filter.update(&sample, 0.01);
        assert!(filter.is_seeded());
        assert!((attitude.pitch_deg - 20.0).abs() < 1e-3);
    }

    #[test]
    fn complementary_blend_weights() {
        let mut filter = AttitudeFilter::new(FilterMode::Complementary { gyro_weight: 0.96 });
        filter.seed([0.0, 0.0, GRAVITY_MSS]);

        // Gyro says 10 deg/s for 1 s, accelerometer says level
        let sample = ImuSample {
            accel_mss: [0.0, 0.0, GRAVITY_MSS],
            gyro_rads: [10.0 * DEG_TO_RAD, 0.0, 0.0],
        };
        let attitude = filter.update(&sample, 1.0);
        assert!((attitude.pitch_deg - 9.6).abs() < 1e-3);
        assert!(attitude.roll_deg.abs() < 1e-4);
    }

    #[test]
    fn converges_to_accelerometer_angle() {
        let mut filter = AttitudeFilter::new(FilterMode::default());
        filter.seed([0.0, 0.0, GRAVITY_MSS]);
        let sample = ImuSample {
            accel_mss: tilted(15.0),
            gyro_rads: [0.0; 3],
        };
        let mut attitude = Attitude::default();
        for _ in 0..400 {
            attitude = filter.update(&sample, 0.01);
        }
        assert!((attitude.pitch_deg - 15.0).abs() < 0.01);
    }

    #[test]
    fn non_positive_dt_is_clamped() {
        let mut filter = AttitudeFilter::new(FilterMode::Complementary { gyro_weight: 1.0 });
        filter.seed([0.0, 0.0, GRAVITY_MSS]);
        let sample = ImuSample {
            accel_mss: [0.0, 0.0, GRAVITY_MSS],
            gyro_rads: [1.0, 0.0, 0.0],
        };

        let attitude = filter.update(&sample, -5.0);
        let expected = RAD_TO_DEG * MIN_DT_S;
        assert!((attitude.pitch_deg - expected).abs() < 1e-4);

        let attitude = filter.update(&sample, f32::NAN);
        assert!(attitude.pitch_deg.is_finite());
    }

    #[test]
    fn accel_low_pass_mode() {
        let mut filter = AttitudeFilter::new(FilterMode::AccelLowPass { alpha: 0.2 });
        filter.seed([0.0, 0.0, GRAVITY_MSS]);
        let sample = ImuSample {
            accel_mss: tilted(10.0),
            gyro_rads: [5.0, 5.0, 0.0],
        };
        let attitude = filter.update(&sample, 0.01);
        // Gyro ignored: 0.8 * 0 + 0.2 * 10
        assert!((attitude.pitch_deg - 2.0).abs() < 1e-3);
    }

    #[test]
    fn linear_accel_removes_gravity() {
        let accel = tilted(25.0);
        let linear = linear_acceleration(accel, 25.0, 0.0);
        assert!(linear[0].abs() < 1e-3);
        assert!(linear[1].abs() < 1e-3);
        assert!(linear[2].abs() < 1e-3);
    }

    #[test]
    fn missing_imu_holds_snapshot() {
        let mut sensor = AttitudeSensor::new(MockImu::missing(), FilterMode::default());
        assert_eq!(sensor.init(0), Err(SensorError::NotFound));
        assert!(!sensor.is_ready());

        let mut snapshot = SensorSnapshot::new();
        snapshot.pitch = 1234;
        snapshot.roll = -55;
        assert_eq!(sensor.update(10_000, &mut snapshot), SensorStatus::NotReady);
        assert_eq!(snapshot.pitch, 1234);
        assert_eq!(snapshot.roll, -55);
    }

    #[test]
    fn failed_read_holds_last_value() {
        let mut imu = MockImu::level();
        imu.sample.accel_mss = tilted(12.0);
        let mut sensor = AttitudeSensor::new(imu, FilterMode::default());
        sensor.init(0).unwrap();

        let mut snapshot = SensorSnapshot::new();
        assert_eq!(sensor.update(10_000, &mut snapshot), SensorStatus::Updated);
        let held = snapshot;
        assert!((held.pitch - 1200).abs() <= 1);

        sensor.imu_mut().fail_reads = true;
        assert_eq!(sensor.update(20_000, &mut snapshot), SensorStatus::ReadFailed);
        assert_eq!(snapshot, held);
        assert_eq!(sensor.read_failures(), 1);
    }

    #[test]
    fn init_seeds_estimate() {
        let mut sensor = AttitudeSensor::new(MockImu::level(), FilterMode::default());
        assert!(!sensor.has_estimate());
        sensor.init(0).unwrap();
        assert!(sensor.has_estimate());
        assert_eq!(sensor.imu().reads, 1);
    }
}
