//! Software-in-the-loop runner.
//!
//! Builds a complete vehicle from the parameter store (simulated sensors,
//! H-bridge motors, servos on simulated PWM) and runs the control loop on a
//! tokio interval until the shutdown future resolves.
//!
//! A crude attitude plant closes the loop for stabilized frames: servo
//! deflection drives pitch rate, differential thrust drives roll rate, both
//! with linear damping.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use wst_core::actuator::{HBridgeMotor, ServoActuator, ServoConfig};
use wst_core::control_loop::{ControlLoop, InitError, LoopConfig, TickReport};
use wst_core::link::{LinkHealth, LinkStats, LinkSupervisor, Transport, TransportKind};
use wst_core::mixer::{ChannelValues, ControlMixer, FrameType, Mixer};
use wst_core::parameters::{
    register_all, LinkParams, ParamValue, ParameterStore, SensorParams, StabilizerParams,
    VehicleParams,
};
use wst_core::sensors::{
    AttitudeSensor, BatteryMonitor, ClimateSensor, EchoLatch, RangeSampler, Sensor, SensorHub,
    SensorSnapshot, SensorSuite,
};
use wst_core::traits::TimeSource;

use crate::error::SitlError;
use crate::platform::{
    HostClock, SimAdc, SimClimate, SimImu, SimImuConfig, SimPwmPin, SimTrigger, UdpPort,
};

pub const DEFAULT_PORT: u16 = 4210;
pub const DEFAULT_RATE_HZ: u32 = 100;
pub const MAX_RATE_HZ: u32 = 1_000;

/// Simulated surroundings
const SIM_RANGE_CM: f32 = 120.0;
const SIM_BATTERY_V: f32 = 12.6;
const SIM_TEMPERATURE_C: f32 = 21.5;
const SIM_HUMIDITY_PCT: f32 = 40.0;

/// Plant response to a full-scale output (deg/s) and damping (1/s)
const PITCH_AUTHORITY_DEG_S: f32 = 60.0;
const ROLL_AUTHORITY_DEG_S: f32 = 90.0;
const PLANT_DAMPING: f32 = 0.5;

pub const USAGE: &str = "\
Usage: wst_sitl [--port PORT] [--frame FRAME] [--rate HZ]

  --port PORT    UDP port to listen on (default 4210)
  --frame FRAME  differential | single-axis | bicopter (default differential)
  --rate HZ      control loop rate, 1..=1000 (default 100)";

/// Command-line configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SitlConfig {
    pub port: u16,
    pub frame: FrameType,
    pub rate_hz: u32,
}

impl Default for SitlConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            frame: FrameType::Differential,
            rate_hz: DEFAULT_RATE_HZ,
        }
    }
}

impl SitlConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.rate_hz.clamp(1, MAX_RATE_HZ)))
    }
}

/// Parse a frame name or number.
pub fn parse_frame(value: &str) -> Option<FrameType> {
    match value {
        "differential" | "boat" => Some(FrameType::Differential),
        "single-axis" | "single" => Some(FrameType::SingleAxis),
        "bicopter" => Some(FrameType::Bicopter),
        other => other.parse().ok().and_then(FrameType::from_param),
    }
}

/// Parse command-line arguments (program name already stripped).
pub fn parse_args<I>(args: I) -> Result<SitlConfig, SitlError>
where
    I: IntoIterator<Item = String>,
{
    let mut config = SitlConfig::default();
    let mut args = args.into_iter();

    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| SitlError::InvalidArgument(format!("{flag} needs a value")))
        };
        match flag.as_str() {
            "--port" => {
                let v = value()?;
                config.port = v
                    .parse()
                    .map_err(|_| SitlError::InvalidArgument(format!("bad port: {v}")))?;
            }
            "--frame" => {
                let v = value()?;
                config.frame = parse_frame(&v)
                    .ok_or_else(|| SitlError::InvalidArgument(format!("unknown frame: {v}")))?;
            }
            "--rate" => {
                let v = value()?;
                config.rate_hz = v
                    .parse()
                    .ok()
                    .filter(|hz| (1..=MAX_RATE_HZ).contains(hz))
                    .ok_or_else(|| SitlError::InvalidArgument(format!("bad rate: {v}")))?;
            }
            other => {
                return Err(SitlError::InvalidArgument(format!("unknown flag: {other}")));
            }
        }
    }

    Ok(config)
}

/// Parameter store with defaults plus the command-line overrides.
pub fn build_store(config: &SitlConfig) -> Result<ParameterStore, SitlError> {
    let mut store = ParameterStore::new();
    register_all(&mut store)?;
    store.set("LINK_UDP_PORT", ParamValue::Int(i32::from(config.port)))?;
    store.set("FRAME_TYPE", ParamValue::Int(config.frame as i32))?;
    Ok(store)
}

/// State at the end of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub ticks: u64,
    pub health: LinkHealth,
    pub link: LinkStats,
    pub channels: ChannelValues,
    pub snapshot: SensorSnapshot,
}

/// First-order attitude response to the mixer outputs.
#[derive(Debug, Default)]
struct AttitudePlant {
    pitch_deg: f32,
    roll_deg: f32,
}

impl AttitudePlant {
    /// Advance by `dt_s`; returns the body rates [pitch, roll, yaw] in rad/s
    fn step(&mut self, frame: FrameType, channels: &ChannelValues, dt_s: f32) -> [f32; 3] {
        let servo = channels.servos.map_or(0.0, |[left, _]| f32::from(left) / 1000.0);
        let [left, right] = channels.motors;
        let thrust = f32::from(left.saturating_sub(right)) / 2000.0;

        let pitch_rate = match frame {
            FrameType::Differential => 0.0,
            _ => servo * PITCH_AUTHORITY_DEG_S - self.pitch_deg * PLANT_DAMPING,
        };
        let roll_rate = match frame {
            FrameType::Bicopter => thrust * ROLL_AUTHORITY_DEG_S - self.roll_deg * PLANT_DAMPING,
            _ => 0.0,
        };

        self.pitch_deg += pitch_rate * dt_s;
        self.roll_deg += roll_rate * dt_s;
        [pitch_rate.to_radians(), roll_rate.to_radians(), 0.0]
    }
}

/// Run the simulated vehicle until `shutdown` resolves.
///
/// `observer` sees every tick report, e.g. to print health transitions.
pub async fn run<F, O>(
    config: &SitlConfig,
    port: UdpPort,
    shutdown: F,
    mut observer: O,
) -> Result<RunSummary, SitlError>
where
    F: Future<Output = ()>,
    O: FnMut(&TickReport),
{
    let store = build_store(config)?;
    let link_params = LinkParams::from_store(&store);
    let stabilizer = StabilizerParams::from_store(&store);
    let sensor_params = SensorParams::from_store(&store);
    let frame = VehicleParams::from_store(&store).frame;

    // Sensors
    let latch = EchoLatch::new();
    let trigger = SimTrigger::new();
    let mut echo = trigger.echo(&latch, Some(SIM_RANGE_CM));
    let mut range = RangeSampler::new(&latch, trigger, sensor_params.range_config(0));
    let full_scale_v = sensor_params.battery_full_scale_v;
    let mut battery = BatteryMonitor::with_scale(
        SimAdc::with_voltage(SIM_BATTERY_V, full_scale_v),
        full_scale_v,
        sensor_params.battery_read_interval_us(),
    );
    let mut climate = ClimateSensor::new(SimClimate::new(SIM_TEMPERATURE_C, SIM_HUMIDITY_PCT), 0);

    let mut hub: SensorHub<'_, SimImu, 3> = SensorHub::new(AttitudeSensor::new(
        SimImu::new(SimImuConfig::default()),
        sensor_params.filter,
    ));
    let sensors: [&mut dyn Sensor; 3] = [&mut range, &mut battery, &mut climate];
    for sensor in sensors {
        if hub.add(sensor).is_err() {
            return Err(SitlError::Setup("sensor hub full"));
        }
    }

    // Actuators
    let motor = || HBridgeMotor::new(SimPwmPin::new(), SimPwmPin::new());
    let servo = || ServoActuator::new(SimPwmPin::new(), ServoConfig::default());
    let servos = frame.needs_servos().then(|| [servo(), servo()]);
    let mixer = ControlMixer::for_frame(frame, [motor(), motor()], servos, &stabilizer.config)
        .map_err(|e| SitlError::Init(InitError::Actuators(e)))?;

    let link = LinkSupervisor::new(
        Transport::new(TransportKind::Udp, port),
        link_params.link_config(),
    );
    let clock = HostClock::new();
    let mut control = ControlLoop::new(
        link,
        hub,
        mixer,
        clock,
        LoopConfig {
            telemetry_interval_us: link_params.telemetry_interval_us(),
            failsafe: link_params.failsafe,
        },
    );
    control.init()?;

    let mut interval = tokio::time::interval(config.tick_period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut plant = AttitudePlant::default();
    let mut last_us = clock.now_us();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                echo.step(clock.now_us());
                let report = control.tick();

                let dt_s = report.now_us.saturating_sub(last_us) as f32 / 1_000_000.0;
                last_us = report.now_us;
                let rates = plant.step(frame, &control.mixer().channels(), dt_s);
                control
                    .sensors_mut()
                    .attitude_mut()
                    .imu_mut()
                    .set_attitude(plant.pitch_deg, plant.roll_deg, rates);

                observer(&report);
            }
        }
    }

    Ok(RunSummary {
        ticks: control.ticks(),
        health: control.link().health(),
        link: control.link().stats(),
        channels: control.mixer().channels(),
        snapshot: *control.sensors().snapshot(),
    })
}
