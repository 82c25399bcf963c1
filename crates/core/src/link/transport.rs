//! Transport abstraction for the command link
//!
//! A [`TransportPort`] moves raw bytes over one physical medium. The
//! [`Transport`] wrapper adds what differs per medium on top of it:
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │            LinkSupervisor              │
//! └──────────────────┬─────────────────────┘
//!                    │ poll() / send_telemetry()
//!                    ▼
//! ┌────────────────────────────────────────┐
//! │   Transport<P>                          │
//! │   - datagram: exact-length check,       │
//! │     remembers the sender as peer        │
//! │   - serial: sentinel framing            │
//! └──────────────────┬─────────────────────┘
//!                    │ TransportPort
//!        ┌───────────┼───────────┐
//!        ▼           ▼           ▼
//!      UDP       ESP-NOW      Serial
//! ```
//!
//! Exactly one transport is active per vehicle; the kind is chosen once at
//! startup from `LINK_METHOD`.

use core::fmt;

use super::framing::{encode_telemetry, SerialFramer};
use crate::command::{ControlCommand, COMMAND_WIRE_SIZE};
use crate::sensors::SensorSnapshot;

/// Receive buffer size; larger than any valid frame so oversize datagrams
/// are seen as oversize rather than truncated to a valid length
pub const RX_BUFFER_SIZE: usize = 64;

/// Physical medium of the command link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportKind {
    /// WiFi UDP socket
    Udp = 0,
    /// ESP-NOW broadcast radio
    EspNow = 1,
    /// Point-to-point serial byte stream
    Serial = 2,
}

impl TransportKind {
    /// Decode the `LINK_METHOD` parameter
    pub fn from_param(value: i32) -> Option<Self> {
        match value {
            0 => Some(TransportKind::Udp),
            1 => Some(TransportKind::EspNow),
            2 => Some(TransportKind::Serial),
            _ => None,
        }
    }

    /// Datagram transports deliver whole frames and have a return address
    pub fn is_datagram(self) -> bool {
        !matches!(self, TransportKind::Serial)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Udp => write!(f, "UDP"),
            TransportKind::EspNow => write!(f, "ESP-NOW"),
            TransportKind::Serial => write!(f, "serial"),
        }
    }
}

/// Return address of a datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeerAddr {
    /// IPv4 address and port
    Ip([u8; 4], u16),
    /// Radio MAC address
    Mac([u8; 6]),
}

/// Transport-level connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Connectivity {
    /// Medium is up (associated, paired, port open)
    Connected,
    /// Bring-up or re-association in progress
    Connecting,
    /// Explicit loss of the medium (e.g. WiFi association lost)
    Disconnected,
}

/// Transport error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Bring-up failed (bind, pairing, association)
    InitFailed,
    /// Generic I/O error
    IoError,
    /// Operation timed out
    Timeout,
    /// Transport disconnected
    Disconnected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InitFailed => write!(f, "Transport bring-up failed"),
            TransportError::IoError => write!(f, "I/O error"),
            TransportError::Timeout => write!(f, "Operation timed out"),
            TransportError::Disconnected => write!(f, "Transport disconnected"),
        }
    }
}

/// One received unit: a datagram, or a chunk of a byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datagram {
    /// Bytes written into the receive buffer
    pub len: usize,
    /// Sender, when the medium reports one
    pub source: Option<PeerAddr>,
}

/// Raw transport I/O
///
/// Implementations live with the platform (socket, radio driver, UART).
/// None of the methods may block, except `init` during bring-up.
pub trait TransportPort {
    /// Bring the medium up (bind, pair, associate)
    ///
    /// May block during bring-up. Failures are returned, never retried
    /// internally without bound.
    fn init(&mut self) -> Result<(), TransportError>;

    /// Receive whatever is pending
    ///
    /// # Returns
    ///
    /// - `Ok(Some(datagram))` - `datagram.len` bytes were written to `buf`.
    ///   A datagram longer than `buf` must report its full length.
    /// - `Ok(None)` - nothing pending
    /// - `Err(TransportError)` - receive failed
    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<Datagram>, TransportError>;

    /// Send bytes, to `peer` when given, otherwise to the medium's default
    /// destination
    fn send(&mut self, peer: Option<PeerAddr>, data: &[u8]) -> Result<usize, TransportError>;

    /// Current connectivity
    fn connectivity(&self) -> Connectivity {
        Connectivity::Connected
    }

    /// Signal quality (RSSI, dBm), when the medium measures it
    fn signal_quality(&self) -> Option<i16> {
        None
    }
}

/// Result of one receive attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// Nothing pending (or a partial serial frame)
    Nothing,
    /// A complete, correctly sized control frame
    Frame(ControlCommand),
    /// A datagram of the wrong length
    Discarded { len: usize },
}

/// Outcome of a telemetry send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryOutcome {
    /// Frame handed to the port
    Sent,
    /// No return address known yet; nothing sent
    Skipped,
}

/// Active transport: a port plus per-medium framing
pub struct Transport<P: TransportPort> {
    kind: TransportKind,
    port: P,
    peer: Option<PeerAddr>,
    framer: SerialFramer,
    rx: [u8; RX_BUFFER_SIZE],
}

impl<P: TransportPort> Transport<P> {
    pub fn new(kind: TransportKind, port: P) -> Self {
        Self {
            kind,
            port,
            peer: None,
            framer: SerialFramer::new(),
            rx: [0; RX_BUFFER_SIZE],
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Last sender of a valid frame (datagram transports)
    pub fn peer(&self) -> Option<PeerAddr> {
        self.peer
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Bytes dropped by the serial framer while resynchronizing
    pub fn resync_bytes(&self) -> u32 {
        self.framer.dropped()
    }

    pub fn init(&mut self) -> Result<(), TransportError> {
        self.peer = None;
        self.framer.reset();
        self.port.init()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.port.connectivity()
    }

    pub fn signal_quality(&self) -> Option<i16> {
        self.port.signal_quality()
    }

    /// Receive and validate one unit from the port
    ///
    /// Datagrams must be exactly [`COMMAND_WIRE_SIZE`] bytes. A serial chunk
    /// may complete several frames; the newest one wins.
    pub fn poll(&mut self) -> Result<Inbound, TransportError> {
        let Some(datagram) = self.port.try_receive(&mut self.rx)? else {
            return Ok(Inbound::Nothing);
        };

        if self.kind.is_datagram() {
            if datagram.len != COMMAND_WIRE_SIZE {
                return Ok(Inbound::Discarded { len: datagram.len });
            }
            return match ControlCommand::from_bytes(&self.rx[..COMMAND_WIRE_SIZE]) {
                Some(command) => {
                    if datagram.source.is_some() {
                        self.peer = datagram.source;
                    }
                    Ok(Inbound::Frame(command))
                }
                None => Ok(Inbound::Discarded { len: datagram.len }),
            };
        }

        let len = datagram.len.min(RX_BUFFER_SIZE);
        let mut newest = None;
        for &byte in &self.rx[..len] {
            if let Some(command) = self.framer.push(byte) {
                newest = Some(command);
            }
        }
        Ok(newest.map_or(Inbound::Nothing, Inbound::Frame))
    }

    /// Send a telemetry frame
    ///
    /// Datagram transports send the bare snapshot to the last known peer
    /// and skip when there is none; serial sends a framed snapshot.
    pub fn send_telemetry(
        &mut self,
        snapshot: &SensorSnapshot,
    ) -> Result<TelemetryOutcome, TransportError> {
        if self.kind.is_datagram() {
            let Some(peer) = self.peer else {
                return Ok(TelemetryOutcome::Skipped);
            };
            self.port.send(Some(peer), &snapshot.to_bytes())?;
        } else {
            self.port.send(None, &encode_telemetry(snapshot))?;
        }
        Ok(TelemetryOutcome::Sent)
    }
}
