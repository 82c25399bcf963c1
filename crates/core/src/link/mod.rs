//! Command link
//!
//! - [`transport`]: Port trait and per-medium framing (UDP, ESP-NOW, serial)
//! - [`framing`]: Sentinel framing for the serial byte stream
//! - [`router`]: Control and telemetry over two different ports
//! - [`supervisor`]: Frame acceptance and link-health verdict

pub mod framing;
pub mod router;
pub mod supervisor;
pub mod transport;

pub use router::{RoutedPort, RouterStats};
pub use supervisor::{assess, LinkConfig, LinkHealth, LinkStats, LinkSupervisor, PollOutcome};
pub use transport::{
    Connectivity, Datagram, Inbound, PeerAddr, TelemetryOutcome, Transport, TransportError,
    TransportKind, TransportPort,
};
