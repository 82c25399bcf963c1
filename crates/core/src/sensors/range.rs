//! Ultrasonic range sampler (HC-SR04 style)
//!
//! The measurement is split across two contexts:
//!
//! ```text
//!  edge interrupt ──► EchoLatch::on_edge()      (rising: stamp, falling: duration)
//!                          │  critical section
//!  superloop ─────► RangeSampler::update() ──► take sample, publish distance,
//!                                               fire next trigger pulse
//! ```
//!
//! Each sampler borrows the [`EchoLatch`] its interrupt feeds; the caller
//! owns it (typically a `static` per sensor). The latch fields are only
//! touched inside a critical section.
//!
//! State machine: `Idle` → (ping interval elapsed) pulse → `AwaitingEcho`
//! → (sample taken) → `Idle`. An echo that never arrives is abandoned after
//! the echo timeout and the sampler falls back to `Idle`.

use super::{Sensor, SensorError, SensorSnapshot, SensorStatus, DISTANCE_SLOTS};
use crate::traits::{CriticalSectionState, SharedState};

/// Speed of sound, centimetres per microsecond
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.034;

/// Minimum time between trigger pulses
pub const DEFAULT_PING_INTERVAL_US: u64 = 60_000;

/// Time after which a pending echo is abandoned
pub const DEFAULT_ECHO_TIMEOUT_US: u64 = 30_000;

/// Convert a round-trip echo time into a one-way distance (cm)
pub fn echo_to_distance_cm(echo_us: u32) -> f32 {
    echo_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0
}

/// Fields shared between the edge interrupt and the poller
#[derive(Debug, Clone, Copy, Default)]
struct EchoState {
    start_us: Option<u64>,
    echo_us: u32,
    new_data: bool,
}

/// Interrupt-side half of the range sampler
pub struct EchoLatch {
    state: CriticalSectionState<EchoState>,
}

impl EchoLatch {
    /// Create an empty latch (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            state: CriticalSectionState::new(EchoState {
                start_us: None,
                echo_us: 0,
                new_data: false,
            }),
        }
    }

    /// Edge callback, invoked from the echo pin interrupt
    ///
    /// `level_high` is the pin level after the edge. A falling edge without
    /// a preceding rising edge is ignored.
    pub fn on_edge(&self, level_high: bool, now_us: u64) {
        self.state.with_mut(|s| {
            if level_high {
                s.start_us = Some(now_us);
            } else if let Some(start) = s.start_us.take() {
                s.echo_us = now_us.saturating_sub(start).min(u32::MAX as u64) as u32;
                s.new_data = true;
            }
        });
    }

    /// Take a completed echo duration, clearing the new-data flag
    pub fn take(&self) -> Option<u32> {
        self.state.with_mut(|s| {
            if s.new_data {
                s.new_data = false;
                Some(s.echo_us)
            } else {
                None
            }
        })
    }

    /// Whether a completed echo is waiting
    pub fn has_new_data(&self) -> bool {
        self.state.with(|s| s.new_data)
    }

    /// Drop any half-measured echo
    pub fn clear(&self) {
        self.state.with_mut(|s| {
            s.start_us = None;
            s.new_data = false;
        });
    }
}

impl Default for EchoLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Trigger pin collaborator; `pulse` emits the ~10 µs trigger
pub trait TriggerPin {
    fn init(&mut self) -> Result<(), SensorError>;

    fn pulse(&mut self);
}

/// Sampler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeState {
    Idle,
    AwaitingEcho { since_us: u64 },
}

/// Range sampler timing and placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeConfig {
    /// Snapshot distance slot (0..6)
    pub slot: usize,
    pub ping_interval_us: u64,
    pub echo_timeout_us: u64,
}

impl RangeConfig {
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            ping_interval_us: DEFAULT_PING_INTERVAL_US,
            echo_timeout_us: DEFAULT_ECHO_TIMEOUT_US,
        }
    }
}

/// Poll-side half of the range sampler
pub struct RangeSampler<'a, P: TriggerPin> {
    latch: &'a EchoLatch,
    trigger: P,
    config: RangeConfig,
    state: RangeState,
    last_ping_us: Option<u64>,
    last_distance_cm: Option<f32>,
    samples: u32,
    timeouts: u32,
}

impl<'a, P: TriggerPin> RangeSampler<'a, P> {
    pub fn new(latch: &'a EchoLatch, trigger: P, config: RangeConfig) -> Self {
        Self {
            latch,
            trigger,
            config,
            state: RangeState::Idle,
            last_ping_us: None,
            last_distance_cm: None,
            samples: 0,
            timeouts: 0,
        }
    }

    pub fn state(&self) -> RangeState {
        self.state
    }

    /// Most recent published distance (cm)
    pub fn last_distance_cm(&self) -> Option<f32> {
        self.last_distance_cm
    }

    /// Echoes converted and published
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Pings abandoned without an echo
    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    pub fn trigger(&self) -> &P {
        &self.trigger
    }

    fn ping_due(&self, now_us: u64) -> bool {
        match self.last_ping_us {
            Some(last) => now_us.saturating_sub(last) >= self.config.ping_interval_us,
            None => true,
        }
    }
}

impl<P: TriggerPin> Sensor for RangeSampler<'_, P> {
    fn init(&mut self, _now_us: u64) -> Result<(), SensorError> {
        if self.config.slot >= DISTANCE_SLOTS {
            return Err(SensorError::InvalidReading);
        }
        self.latch.clear();
        self.trigger.init()
    }

    fn update(&mut self, now_us: u64, snapshot: &mut SensorSnapshot) -> SensorStatus {
        let mut status = SensorStatus::NoNewData;

        if let Some(echo_us) = self.latch.take() {
            let distance = echo_to_distance_cm(echo_us);
            if let Some(slot) = snapshot.distance.get_mut(self.config.slot) {
                *slot = distance as u16;
            }
            self.last_distance_cm = Some(distance);
            self.samples = self.samples.saturating_add(1);
            self.state = RangeState::Idle;
            status = SensorStatus::Updated;
        } else if let RangeState::AwaitingEcho { since_us } = self.state {
            if now_us.saturating_sub(since_us) > self.config.echo_timeout_us {
                crate::log_debug!("range slot {} echo timeout", self.config.slot);
                self.latch.clear();
                self.timeouts = self.timeouts.saturating_add(1);
                self.state = RangeState::Idle;
            }
        }

        if self.state == RangeState::Idle && self.ping_due(now_us) {
            self.last_ping_us = Some(now_us);
            self.state = RangeState::AwaitingEcho { since_us: now_us };
            self.trigger.pulse();
        }

        status
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTrigger;
    use super::*;

    #[test]
    fn latch_measures_echo_width() {
        let latch = EchoLatch::new();
        latch.on_edge(true, 1_000);
        assert!(!latch.has_new_data());
        latch.on_edge(false, 1_580);
        assert!(latch.has_new_data());
        assert_eq!(latch.take(), Some(580));
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn latch_ignores_falling_without_rising() {
        let latch = EchoLatch::new();
        latch.on_edge(false, 500);
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn echo_580us_is_9_86_cm() {
        let latch = EchoLatch::new();
        let mut sampler = RangeSampler::new(&latch, MockTrigger::default(), RangeConfig::new(2));
        sampler.init(0).unwrap();
        let mut snapshot = SensorSnapshot::new();

        // First update fires the trigger
        assert_eq!(sampler.update(0, &mut snapshot), SensorStatus::NoNewData);
        assert_eq!(sampler.trigger().pulses, 1);
        assert_eq!(sampler.state(), RangeState::AwaitingEcho { since_us: 0 });

        latch.on_edge(true, 200);
        latch.on_edge(false, 780);

        assert_eq!(sampler.update(1_000, &mut snapshot), SensorStatus::Updated);
        let distance = sampler.last_distance_cm().unwrap();
        assert!((distance - 9.86).abs() < 1e-3);
        assert_eq!(snapshot.distance[2], 9);
        assert_eq!(sampler.state(), RangeState::Idle);

        // Flag cleared exactly once: no double count
        assert_eq!(sampler.update(2_000, &mut snapshot), SensorStatus::NoNewData);
        assert_eq!(sampler.samples(), 1);
        assert!(!latch.has_new_data());
    }

    #[test]
    fn respects_ping_interval() {
        let latch = EchoLatch::new();
        let mut sampler = RangeSampler::new(&latch, MockTrigger::default(), RangeConfig::new(0));
        let mut snapshot = SensorSnapshot::new();

        sampler.update(0, &mut snapshot);
        latch.on_edge(true, 100);
        latch.on_edge(false, 1_100);
        sampler.update(2_000, &mut snapshot);
        assert_eq!(sampler.trigger().pulses, 1);

        sampler.update(59_999, &mut snapshot);
        assert_eq!(sampler.trigger().pulses, 1);

        sampler.update(60_000, &mut snapshot);
        assert_eq!(sampler.trigger().pulses, 2);
    }

    #[test]
    fn stuck_echo_is_abandoned_and_retried() {
        let latch = EchoLatch::new();
        let mut sampler = RangeSampler::new(&latch, MockTrigger::default(), RangeConfig::new(0));
        let mut snapshot = SensorSnapshot::new();
        snapshot.distance[0] = 77;

        sampler.update(0, &mut snapshot);
        // Rising edge seen, falling edge never arrives
        latch.on_edge(true, 50);

        sampler.update(30_000, &mut snapshot);
        assert!(matches!(sampler.state(), RangeState::AwaitingEcho { .. }));

        sampler.update(30_001, &mut snapshot);
        assert_eq!(sampler.state(), RangeState::Idle);
        assert_eq!(sampler.timeouts(), 1);
        assert_eq!(snapshot.distance[0], 77);

        // Late falling edge of the abandoned ping is ignored
        latch.on_edge(false, 40_000);
        assert!(!latch.has_new_data());

        sampler.update(60_000, &mut snapshot);
        assert_eq!(sampler.trigger().pulses, 2);
    }

    #[test]
    fn invalid_slot_rejected() {
        let latch = EchoLatch::new();
        let mut sampler = RangeSampler::new(&latch, MockTrigger::default(), RangeConfig::new(6));
        assert_eq!(sampler.init(0), Err(SensorError::InvalidReading));
    }

    #[test]
    fn static_latch_from_interrupt_context() {
        static LATCH: EchoLatch = EchoLatch::new();

        let handle = std::thread::spawn(|| {
            LATCH.on_edge(true, 10);
            LATCH.on_edge(false, 300);
        });
        handle.join().unwrap();

        assert_eq!(LATCH.take(), Some(290));
    }
}
