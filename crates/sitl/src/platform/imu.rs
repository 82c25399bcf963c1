//! Simulated IMU.
//!
//! Produces the accelerometer vector a stationary vehicle at a given
//! pitch/roll would measure, plus a gyro rate, with optional uniform noise
//! from a seedable RNG for deterministic runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wst_core::sensors::attitude::GRAVITY_MSS;
use wst_core::sensors::{ImuPort, ImuSample, SensorError};

/// Configuration for the simulated IMU.
#[derive(Debug, Clone)]
pub struct SimImuConfig {
    /// Accelerometer noise amplitude in m/s².
    pub accel_noise_mss: f32,
    /// Gyroscope noise amplitude in rad/s.
    pub gyro_noise_rads: f32,
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
    /// Whether the device answers during init.
    pub present: bool,
}

impl Default for SimImuConfig {
    fn default() -> Self {
        Self {
            accel_noise_mss: 0.05,
            gyro_noise_rads: 0.002,
            seed: None,
            present: true,
        }
    }
}

pub struct SimImu {
    config: SimImuConfig,
    rng: StdRng,
    pitch_deg: f32,
    roll_deg: f32,
    rate_rads: [f32; 3],
    reads: u64,
}

impl SimImu {
    pub fn new(config: SimImuConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            pitch_deg: 0.0,
            roll_deg: 0.0,
            rate_rads: [0.0; 3],
            reads: 0,
        }
    }

    /// Noise-free IMU for tests.
    pub fn ideal() -> Self {
        Self::new(SimImuConfig {
            accel_noise_mss: 0.0,
            gyro_noise_rads: 0.0,
            seed: Some(0),
            present: true,
        })
    }

    /// Set the true attitude and body rates.
    pub fn set_attitude(&mut self, pitch_deg: f32, roll_deg: f32, rate_rads: [f32; 3]) {
        self.pitch_deg = pitch_deg;
        self.roll_deg = roll_deg;
        self.rate_rads = rate_rads;
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    pub fn roll_deg(&self) -> f32 {
        self.roll_deg
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn noise(&mut self, amplitude: f32) -> f32 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..amplitude)
        } else {
            0.0
        }
    }
}

/// Gravity as seen by a level-mounted accelerometer at the given attitude
pub fn gravity_vector(pitch_deg: f32, roll_deg: f32) -> [f32; 3] {
    let (sp, cp) = pitch_deg.to_radians().sin_cos();
    let (sr, cr) = roll_deg.to_radians().sin_cos();
    [
        -GRAVITY_MSS * sr * cp,
        GRAVITY_MSS * sp * cr,
        GRAVITY_MSS * cp * cr,
    ]
}

impl ImuPort for SimImu {
    fn init(&mut self) -> Result<(), SensorError> {
        if self.config.present {
            Ok(())
        } else {
            Err(SensorError::NotFound)
        }
    }

    fn read(&mut self) -> Result<ImuSample, SensorError> {
        self.reads += 1;
        let (an, gn) = (self.config.accel_noise_mss, self.config.gyro_noise_rads);

        let mut accel_mss = gravity_vector(self.pitch_deg, self.roll_deg);
        for axis in accel_mss.iter_mut() {
            *axis += self.noise(an);
        }
        let mut gyro_rads = self.rate_rads;
        for axis in gyro_rads.iter_mut() {
            *axis += self.noise(gn);
        }

        Ok(ImuSample {
            accel_mss,
            gyro_rads,
        })
    }
}
