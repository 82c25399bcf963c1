//! Simulated ultrasonic range sensor pins.
//!
//! [`SimTrigger`] stands in for the trigger output; [`SimEcho`] plays the
//! echo pin interrupt, feeding both edges of a reflection into the
//! sampler's [`EchoLatch`] after each trigger pulse.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use wst_core::sensors::range::SPEED_OF_SOUND_CM_PER_US;
use wst_core::sensors::{EchoLatch, SensorError, TriggerPin};

/// Simulated trigger output counting its pulses.
#[derive(Debug, Clone, Default)]
pub struct SimTrigger {
    pulses: Arc<AtomicU32>,
}

impl SimTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger pulses emitted so far.
    pub fn pulses(&self) -> u32 {
        self.pulses.load(Ordering::Relaxed)
    }

    /// Echo generator answering this trigger through `latch`.
    pub fn echo<'a>(&self, latch: &'a EchoLatch, distance_cm: Option<f32>) -> SimEcho<'a> {
        SimEcho {
            latch,
            pulses: Arc::clone(&self.pulses),
            answered: self.pulses(),
            distance_cm,
        }
    }
}

impl TriggerPin for SimTrigger {
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn pulse(&mut self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }
}

/// Echo pin model: one reflection per trigger pulse.
pub struct SimEcho<'a> {
    latch: &'a EchoLatch,
    pulses: Arc<AtomicU32>,
    answered: u32,
    distance_cm: Option<f32>,
}

impl SimEcho<'_> {
    /// Target distance; `None` means nothing in range (no echo).
    pub fn set_distance_cm(&mut self, distance_cm: Option<f32>) {
        self.distance_cm = distance_cm;
    }

    /// Round-trip time for a target distance (µs).
    pub fn echo_us(distance_cm: f32) -> u64 {
        (distance_cm * 2.0 / SPEED_OF_SOUND_CM_PER_US) as u64
    }

    /// Answer any unanswered trigger pulse; returns whether an echo was fed.
    pub fn step(&mut self, now_us: u64) -> bool {
        let pulses = self.pulses.load(Ordering::Relaxed);
        if pulses == self.answered {
            return false;
        }
        self.answered = pulses;

        match self.distance_cm {
            Some(distance) => {
                self.latch.on_edge(true, now_us);
                self.latch.on_edge(false, now_us + Self::echo_us(distance));
                true
            }
            None => false,
        }
    }
}
