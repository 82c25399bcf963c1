//! Per-tick orchestration
//!
//! Sequences the link, sensors, telemetry and mixer in a fixed order every
//! tick:
//!
//! 1. poll the link (at most one inbound unit)
//! 2. update sensors
//! 3. send telemetry when the interval has elapsed
//! 4. update the mixer, or stop it when the failsafe policy says so
//!
//! No step is skipped because an earlier one failed. The clock is read once
//! per tick and the same timestamp is handed to every component.
//!
//! # Failsafe
//!
//! The link supervisor only reports health. What happens to the actuators
//! on a bad verdict is decided here by [`FailsafeAction`]:
//!
//! | Action           | Healthy | Degraded | Lost |
//! |------------------|---------|----------|------|
//! | `Inform`         | run     | run      | run  |
//! | `StopOnLost`     | run     | run      | stop |
//! | `StopOnDegraded` | run     | stop     | stop |
//!
//! While stopped the mixer is still updated without inputs so channel
//! housekeeping (ESC arming) keeps running.

use core::fmt;

use crate::actuator::ActuatorError;
use crate::link::{
    LinkHealth, LinkSupervisor, PollOutcome, TelemetryOutcome, TransportError, TransportPort,
};
use crate::mixer::Mixer;
use crate::sensors::SensorSuite;
use crate::traits::TimeSource;

/// Default telemetry interval
pub const DEFAULT_TELEMETRY_INTERVAL_US: u64 = 100_000;

/// Actuator policy on an unhealthy link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailsafeAction {
    /// Report only; the last command keeps being applied
    Inform = 0,
    /// Stop all channels while the link is lost
    #[default]
    StopOnLost = 1,
    /// Stop all channels while the link is degraded or lost
    StopOnDegraded = 2,
}

impl FailsafeAction {
    /// Decode the `LINK_FS_ACTION` parameter
    pub fn from_param(value: i32) -> Option<Self> {
        match value {
            0 => Some(FailsafeAction::Inform),
            1 => Some(FailsafeAction::StopOnLost),
            2 => Some(FailsafeAction::StopOnDegraded),
            _ => None,
        }
    }

    /// Whether this policy stops the actuators at the given health
    pub fn triggers(self, health: LinkHealth) -> bool {
        match self {
            FailsafeAction::Inform => false,
            FailsafeAction::StopOnLost => health >= LinkHealth::Lost,
            FailsafeAction::StopOnDegraded => health >= LinkHealth::Degraded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub telemetry_interval_us: u64,
    pub failsafe: FailsafeAction,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_us: DEFAULT_TELEMETRY_INTERVAL_US,
            failsafe: FailsafeAction::default(),
        }
    }
}

/// Startup failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Actuator channels could not be brought to neutral
    Actuators(ActuatorError),
    /// Transport bring-up failed
    Link(TransportError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Actuators(e) => write!(f, "actuator init: {}", e),
            InitError::Link(e) => write!(f, "link init: {}", e),
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub now_us: u64,
    pub poll: PollOutcome,
    pub health: LinkHealth,
    /// `None` when telemetry was not due this tick
    pub telemetry: Option<Result<TelemetryOutcome, TransportError>>,
    /// Actuators were stopped by the failsafe policy
    pub stopped: bool,
}

pub struct ControlLoop<P, S, X, T>
where
    P: TransportPort,
    S: SensorSuite,
    X: Mixer,
    T: TimeSource,
{
    link: LinkSupervisor<P>,
    sensors: S,
    mixer: X,
    clock: T,
    config: LoopConfig,
    last_telemetry_us: Option<u64>,
    stopped: bool,
    ticks: u64,
}

impl<P, S, X, T> ControlLoop<P, S, X, T>
where
    P: TransportPort,
    S: SensorSuite,
    X: Mixer,
    T: TimeSource,
{
    pub fn new(link: LinkSupervisor<P>, sensors: S, mixer: X, clock: T, config: LoopConfig) -> Self {
        Self {
            link,
            sensors,
            mixer,
            clock,
            config,
            last_telemetry_us: None,
            stopped: false,
            ticks: 0,
        }
    }

    /// Bring everything up: actuators to neutral, sensors, then the link
    ///
    /// A sensor that fails to initialize is logged and left not-ready; the
    /// loop still runs. Actuator and link failures are returned.
    pub fn init(&mut self) -> Result<(), InitError> {
        self.mixer.init().map_err(InitError::Actuators)?;

        if let Err(e) = self.sensors.init(self.clock.now_us()) {
            crate::log_warn!("sensors degraded at startup: {}", e);
        }

        self.link.init().map_err(InitError::Link)
    }

    /// Run one cycle
    pub fn tick(&mut self) -> TickReport {
        let now_us = self.clock.now_us();
        self.ticks = self.ticks.wrapping_add(1);

        let poll = self.link.poll(now_us);

        self.sensors.update(now_us);

        let telemetry = if self.telemetry_due(now_us) {
            self.last_telemetry_us = Some(now_us);
            let result = self.link.send_telemetry(self.sensors.snapshot());
            if let Err(e) = result {
                crate::log_debug!("telemetry send failed: {}", e);
            }
            Some(result)
        } else {
            None
        };

        let health = self.link.health();
        let stop = self.config.failsafe.triggers(health);
        if stop != self.stopped {
            if stop {
                crate::log_warn!("failsafe: link {}, stopping actuators", health);
            } else {
                crate::log_info!("failsafe cleared, link {}", health);
            }
            self.stopped = stop;
        }

        if stop {
            self.mixer.stop_all();
            self.mixer.update(None, None, now_us);
        } else {
            self.mixer
                .update(self.link.command(), self.sensors.valid_snapshot(), now_us);
        }

        TickReport {
            now_us,
            poll,
            health,
            telemetry,
            stopped: stop,
        }
    }

    fn telemetry_due(&self, now_us: u64) -> bool {
        self.last_telemetry_us.map_or(true, |last| {
            now_us.saturating_sub(last) >= self.config.telemetry_interval_us
        })
    }

    pub fn link(&self) -> &LinkSupervisor<P> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkSupervisor<P> {
        &mut self.link
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn mixer(&self) -> &X {
        &self.mixer
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Whether the failsafe is currently holding the actuators stopped
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
