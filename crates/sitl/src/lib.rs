//! Host-side harness for `wst_core`.
//!
//! [`platform`] implements the core's ports on top of std sockets, timers and
//! simulated devices; [`runner`] wires them into a full control loop that can
//! be driven over UDP from a ground station on the same machine.

pub mod error;
pub mod platform;
pub mod runner;

pub use error::SitlError;
pub use platform::{
    HostClock, SimAdc, SimClimate, SimClock, SimEcho, SimImu, SimImuConfig, SimPwmPin,
    SimSerialPort, SimTrigger, UdpPort,
};
pub use runner::{build_store, parse_args, parse_frame, run, RunSummary, SitlConfig, USAGE};
