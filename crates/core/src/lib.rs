#![cfg_attr(not(test), no_std)]

//! wst_core - Flight/vehicle control core for the WST boat and bicopter
//!
//! This crate turns an operator's control packet plus live sensor readings
//! into actuator commands, while judging whether the command link is healthy
//! enough to trust.
//!
//! # Design Principles
//!
//! - **Pure no_std**: no platform code; runs unchanged on the host for tests
//! - **Ports, not drivers**: radios, sockets, I2C and PWM hardware are reached
//!   through traits (`TransportPort`, `ImuPort`, `TriggerPin`, `PwmPin`, ...)
//! - **Values, not panics**: every failure is a status enum or an `Option`
//!
//! # Modules
//!
//! - [`command`]: Control frame wire format
//! - [`link`]: Transports and the link-health supervisor
//! - [`sensors`]: Attitude filter, range sampler, battery and climate sensors
//! - [`mixer`]: Differential-drive and PID-stabilized mixers
//! - [`actuator`]: Actuator port and set-point to pulse mapping
//! - [`control_loop`]: Per-tick orchestration
//! - [`parameters`]: Runtime configuration store
//! - [`traits`]: Time and shared-state abstractions

// Logging macros (log_info!, log_warn!, ...) are exported at crate root
pub mod logging;

pub mod actuator;
pub mod command;
pub mod control_loop;
pub mod link;
pub mod mixer;
pub mod parameters;
pub mod sensors;
pub mod traits;

pub use command::ControlCommand;
pub use control_loop::{ControlLoop, FailsafeAction, LoopConfig};
pub use link::{LinkHealth, LinkSupervisor};
pub use sensors::SensorSnapshot;
