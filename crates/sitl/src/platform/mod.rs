//! Host implementations of the core's collaborator ports.
//!
//! | Port           | Host implementation          |
//! |----------------|------------------------------|
//! | `TransportPort`| [`UdpPort`], [`SimSerialPort`] |
//! | `TimeSource`   | [`HostClock`], [`SimClock`]  |
//! | `ImuPort`      | [`SimImu`]                   |
//! | `TriggerPin`   | [`SimTrigger`] + [`SimEcho`] |
//! | `AdcPort`      | [`SimAdc`]                   |
//! | `ClimatePort`  | [`SimClimate`]               |
//! | `PwmPin`       | [`SimPwmPin`]                |

pub mod analog;
pub mod gpio;
pub mod imu;
pub mod pwm;
pub mod timer;
pub mod uart;
pub mod udp;

pub use analog::{SimAdc, SimClimate};
pub use gpio::{SimEcho, SimTrigger};
pub use imu::{SimImu, SimImuConfig};
pub use pwm::SimPwmPin;
pub use timer::{HostClock, SimClock};
pub use uart::SimSerialPort;
pub use udp::UdpPort;
