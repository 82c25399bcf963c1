//! Split-medium transport
//!
//! Routes control traffic and telemetry over two different ports, e.g.
//! control frames from an ESP-NOW dongle and telemetry out over UDP.
//!
//! ```text
//!   control port ──► try_receive() ──┐
//!                                    ├── RoutedPort ── Transport<_>
//!   telemetry port ◄── send() ───────┘
//! ```
//!
//! Connectivity and signal quality are those of the control port, since
//! that is what the link-health verdict is about.

use super::transport::{Connectivity, Datagram, PeerAddr, TransportError, TransportPort};

/// Per-direction statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Units received on the control port
    pub received: u32,
    /// Sends accepted by the telemetry port
    pub sent: u32,
    /// Number of receive errors
    pub receive_errors: u32,
    /// Number of send errors
    pub send_errors: u32,
}

pub struct RoutedPort<C: TransportPort, T: TransportPort> {
    control: C,
    telemetry: T,
    stats: RouterStats,
}

impl<C: TransportPort, T: TransportPort> RoutedPort<C, T> {
    pub fn new(control: C, telemetry: T) -> Self {
        Self {
            control,
            telemetry,
            stats: RouterStats::default(),
        }
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }
}

impl<C: TransportPort, T: TransportPort> TransportPort for RoutedPort<C, T> {
    /// Both ports must come up; the control port is brought up first
    fn init(&mut self) -> Result<(), TransportError> {
        self.control.init()?;
        self.telemetry.init()
    }

    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<Datagram>, TransportError> {
        match self.control.try_receive(buf) {
            Ok(Some(datagram)) => {
                self.stats.received = self.stats.received.wrapping_add(1);
                Ok(Some(datagram))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.stats.receive_errors = self.stats.receive_errors.wrapping_add(1);
                Err(e)
            }
        }
    }

    fn send(&mut self, peer: Option<PeerAddr>, data: &[u8]) -> Result<usize, TransportError> {
        match self.telemetry.send(peer, data) {
            Ok(n) => {
                self.stats.sent = self.stats.sent.wrapping_add(1);
                Ok(n)
            }
            Err(e) => {
                self.stats.send_errors = self.stats.send_errors.wrapping_add(1);
                Err(e)
            }
        }
    }

    fn connectivity(&self) -> Connectivity {
        self.control.connectivity()
    }

    fn signal_quality(&self) -> Option<i16> {
        self.control.signal_quality()
    }
}

#[cfg(test)]
mod tests {
    use super::super::transport::mock::MockTransportPort;
    use super::*;

    #[test]
    fn receives_on_control_sends_on_telemetry() {
        let mut control = MockTransportPort::new();
        control.push_rx(&[0u8; 8], None);
        control.rssi = Some(-60);
        let mut router = RoutedPort::new(control, MockTransportPort::new());

        let mut buf = [0u8; 16];
        assert!(router.try_receive(&mut buf).unwrap().is_some());
        router.send(None, b"telemetry").unwrap();

        assert!(router.control().sent.is_empty());
        assert_eq!(router.telemetry().sent.len(), 1);
        assert_eq!(router.signal_quality(), Some(-60));
        assert_eq!(
            router.stats(),
            RouterStats {
                received: 1,
                sent: 1,
                receive_errors: 0,
                send_errors: 0,
            }
        );
    }

    #[test]
    fn init_stops_at_first_failure() {
        let mut control = MockTransportPort::new();
        control.init_error = Some(TransportError::InitFailed);
        let mut router = RoutedPort::new(control, MockTransportPort::new());

        assert_eq!(router.init(), Err(TransportError::InitFailed));
        assert_eq!(router.telemetry().inits, 0);
    }

    #[test]
    fn counts_errors() {
        let mut control = MockTransportPort::new();
        control.push_error(TransportError::IoError);
        let mut telemetry = MockTransportPort::new();
        telemetry.send_error = Some(TransportError::Disconnected);
        let mut router = RoutedPort::new(control, telemetry);

        let mut buf = [0u8; 8];
        assert!(router.try_receive(&mut buf).is_err());
        assert!(router.send(None, &[1]).is_err());
        assert_eq!(router.stats().receive_errors, 1);
        assert_eq!(router.stats().send_errors, 1);
    }
}
