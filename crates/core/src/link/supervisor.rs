//! Command-link supervisor
//!
//! Owns the active [`Transport`], turns valid inbound frames into the
//! current [`ControlCommand`], and derives a [`LinkHealth`] verdict every
//! poll.
//!
//! # Health rule
//!
//! | Condition                                             | Verdict    |
//! |-------------------------------------------------------|------------|
//! | transport reports `Disconnected`                      | `Lost`     |
//! | fresh frame, `Connected`, signal ≥ floor (or unknown) | `Healthy`  |
//! | anything else, including before the first frame       | `Degraded` |
//!
//! "Fresh" means `now - last_receipt <= rogue_timeout`. Recovery is
//! immediate on the next valid frame; there is no extra hysteresis.
//!
//! The supervisor only reports. Whether actuators are stopped on a bad
//! verdict is decided by the control loop's failsafe policy.

use super::transport::{
    Connectivity, Inbound, TelemetryOutcome, Transport, TransportError, TransportKind,
    TransportPort,
};
use crate::command::ControlCommand;
use crate::sensors::SensorSnapshot;

/// Default rogue time: longest tolerated gap between valid frames
pub const DEFAULT_ROGUE_TIMEOUT_US: u64 = 1_000_000;

/// Default signal floor (dBm)
pub const DEFAULT_MIN_SIGNAL_DBM: i16 = -80;

/// Link trustworthiness, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkHealth {
    Healthy,
    Degraded,
    Lost,
}

impl core::fmt::Display for LinkHealth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LinkHealth::Healthy => write!(f, "healthy"),
            LinkHealth::Degraded => write!(f, "degraded"),
            LinkHealth::Lost => write!(f, "lost"),
        }
    }
}

/// Supervisor thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    pub rogue_timeout_us: u64,
    pub min_signal_dbm: i16,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            rogue_timeout_us: DEFAULT_ROGUE_TIMEOUT_US,
            min_signal_dbm: DEFAULT_MIN_SIGNAL_DBM,
        }
    }
}

/// Derive the link verdict
///
/// # Arguments
///
/// * `now_us` - Current time
/// * `last_receipt_us` - Time of the last valid frame, `None` before the first
/// * `connectivity` - Transport-level connectivity
/// * `signal_dbm` - Signal quality, `None` when the medium does not measure it
/// * `config` - Thresholds
pub fn assess(
    now_us: u64,
    last_receipt_us: Option<u64>,
    connectivity: Connectivity,
    signal_dbm: Option<i16>,
    config: &LinkConfig,
) -> LinkHealth {
    if connectivity == Connectivity::Disconnected {
        return LinkHealth::Lost;
    }

    let fresh = last_receipt_us
        .is_some_and(|last| now_us.saturating_sub(last) <= config.rogue_timeout_us);
    let signal_ok = signal_dbm.map_or(true, |dbm| dbm >= config.min_signal_dbm);

    if fresh && connectivity == Connectivity::Connected && signal_ok {
        LinkHealth::Healthy
    } else {
        LinkHealth::Degraded
    }
}

/// Result of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// Nothing received (or a receive error, counted in stats)
    NoFrame,
    /// A valid frame replaced the current command
    Accepted,
    /// A frame of the wrong length was dropped; state unchanged
    Discarded,
}

/// Link statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Valid control frames
    pub frames_accepted: u32,
    /// Datagrams of the wrong length
    pub frames_discarded: u32,
    /// Serial bytes dropped while resynchronizing
    pub resync_bytes: u32,
    /// Number of receive errors
    pub receive_errors: u32,
    /// Telemetry frames handed to the transport
    pub telemetry_sent: u32,
    /// Telemetry frames skipped for lack of a peer
    pub telemetry_skipped: u32,
    /// Number of send errors
    pub send_errors: u32,
    /// Health verdict changes
    pub health_changes: u32,
}

pub struct LinkSupervisor<P: TransportPort> {
    transport: Transport<P>,
    config: LinkConfig,
    command: Option<ControlCommand>,
    last_receipt_us: Option<u64>,
    health: LinkHealth,
    stats: LinkStats,
}

impl<P: TransportPort> LinkSupervisor<P> {
    pub fn new(transport: Transport<P>, config: LinkConfig) -> Self {
        Self {
            transport,
            config,
            command: None,
            last_receipt_us: None,
            health: LinkHealth::Degraded,
            stats: LinkStats::default(),
        }
    }

    /// Bring the transport up
    ///
    /// May block inside the port during bring-up. A failure is returned to
    /// the caller, who decides whether to retry.
    pub fn init(&mut self) -> Result<(), TransportError> {
        let kind = self.transport.kind();
        crate::log_info!("link: bringing up {} transport", kind);
        match self.transport.init() {
            Ok(()) => {
                crate::log_info!("link: {} transport up", kind);
                Ok(())
            }
            Err(e) => {
                crate::log_error!("link: {} bring-up failed: {}", kind, e);
                Err(e)
            }
        }
    }

    /// Take at most one inbound unit from the transport and re-derive health
    pub fn poll(&mut self, now_us: u64) -> PollOutcome {
        let outcome = match self.transport.poll() {
            Ok(Inbound::Frame(command)) => {
                self.command = Some(command);
                self.last_receipt_us = Some(now_us);
                self.stats.frames_accepted = self.stats.frames_accepted.wrapping_add(1);
                PollOutcome::Accepted
            }
            Ok(Inbound::Discarded { len }) => {
                crate::log_debug!("link: discarded {}-byte frame", len);
                self.stats.frames_discarded = self.stats.frames_discarded.wrapping_add(1);
                PollOutcome::Discarded
            }
            Ok(Inbound::Nothing) => PollOutcome::NoFrame,
            Err(e) => {
                crate::log_debug!("link: receive failed: {}", e);
                self.stats.receive_errors = self.stats.receive_errors.wrapping_add(1);
                PollOutcome::NoFrame
            }
        };

        let resync = self.transport.resync_bytes();
        if resync != self.stats.resync_bytes {
            crate::log_debug!("link: serial resync, {} bytes dropped", resync);
            self.stats.resync_bytes = resync;
        }

        self.refresh_health(now_us);
        outcome
    }

    /// Send a telemetry frame
    ///
    /// With no known peer on a datagram transport this is a no-op that
    /// returns [`TelemetryOutcome::Skipped`].
    pub fn send_telemetry(
        &mut self,
        snapshot: &SensorSnapshot,
    ) -> Result<TelemetryOutcome, TransportError> {
        match self.transport.send_telemetry(snapshot) {
            Ok(TelemetryOutcome::Sent) => {
                self.stats.telemetry_sent = self.stats.telemetry_sent.wrapping_add(1);
                Ok(TelemetryOutcome::Sent)
            }
            Ok(TelemetryOutcome::Skipped) => {
                self.stats.telemetry_skipped = self.stats.telemetry_skipped.wrapping_add(1);
                Ok(TelemetryOutcome::Skipped)
            }
            Err(e) => {
                self.stats.send_errors = self.stats.send_errors.wrapping_add(1);
                Err(e)
            }
        }
    }

    fn refresh_health(&mut self, now_us: u64) {
        let health = assess(
            now_us,
            self.last_receipt_us,
            self.transport.connectivity(),
            self.transport.signal_quality(),
            &self.config,
        );
        if health != self.health {
            crate::log_info!("link: {} -> {}", self.health, health);
            self.stats.health_changes = self.stats.health_changes.wrapping_add(1);
            self.health = health;
        }
    }

    pub fn health(&self) -> LinkHealth {
        self.health
    }

    /// Latest valid command, `None` until the first frame
    pub fn command(&self) -> Option<&ControlCommand> {
        self.command.as_ref()
    }

    pub fn last_receipt_us(&self) -> Option<u64> {
        self.last_receipt_us
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    pub fn transport(&self) -> &Transport<P> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<P> {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::super::framing::encode_command;
    use super::super::transport::mock::MockTransportPort;
    use super::super::transport::PeerAddr;
    use super::*;

    const GCS: PeerAddr = PeerAddr::Ip([10, 0, 0, 2], 4210);

    fn supervisor(kind: TransportKind) -> LinkSupervisor<MockTransportPort> {
        LinkSupervisor::new(
            Transport::new(kind, MockTransportPort::new()),
            LinkConfig::default(),
        )
    }

    fn port(sup: &mut LinkSupervisor<MockTransportPort>) -> &mut MockTransportPort {
        sup.transport_mut().port_mut()
    }

    #[test]
    fn assess_rules() {
        let config = LinkConfig::default();
        let c = Connectivity::Connected;

        assert_eq!(assess(0, None, c, None, &config), LinkHealth::Degraded);
        assert_eq!(assess(500, Some(0), c, None, &config), LinkHealth::Healthy);
        assert_eq!(assess(1_000_000, Some(0), c, Some(-80), &config), LinkHealth::Healthy);
        assert_eq!(assess(1_000_001, Some(0), c, Some(-40), &config), LinkHealth::Degraded);
        assert_eq!(assess(500, Some(0), c, Some(-81), &config), LinkHealth::Degraded);
        assert_eq!(
            assess(500, Some(0), Connectivity::Connecting, None, &config),
            LinkHealth::Degraded
        );
        assert_eq!(
            assess(500, Some(0), Connectivity::Disconnected, Some(-30), &config),
            LinkHealth::Lost
        );
    }

    #[test]
    fn health_total_order() {
        assert!(LinkHealth::Healthy < LinkHealth::Degraded);
        assert!(LinkHealth::Degraded < LinkHealth::Lost);
    }

    #[test]
    fn degraded_before_first_frame() {
        let mut sup = supervisor(TransportKind::Udp);
        assert_eq!(sup.health(), LinkHealth::Degraded);
        assert_eq!(sup.poll(0), PollOutcome::NoFrame);
        assert_eq!(sup.health(), LinkHealth::Degraded);
        assert!(sup.command().is_none());
    }

    #[test]
    fn valid_frame_accepted() {
        let mut sup = supervisor(TransportKind::Udp);
        let command = ControlCommand::new(300, 0, 0, 0);
        port(&mut sup).push_rx(&command.to_bytes(), Some(GCS));

        assert_eq!(sup.poll(1_000), PollOutcome::Accepted);
        assert_eq!(sup.command(), Some(&command));
        assert_eq!(sup.last_receipt_us(), Some(1_000));
        assert_eq!(sup.health(), LinkHealth::Healthy);
    }

    #[test]
    fn wrong_length_leaves_state_unchanged() {
        let mut sup = supervisor(TransportKind::EspNow);
        let command = ControlCommand::new(1, 2, 3, 4);
        port(&mut sup).push_rx(&command.to_bytes(), None);
        sup.poll(100);

        for len in [0usize, 1, 7, 9, 10, 34] {
            let bytes = [0xAAu8; 40];
            port(&mut sup).push_rx(&bytes[..len], None);
            assert_eq!(sup.poll(200), PollOutcome::Discarded);
            assert_eq!(sup.command(), Some(&command));
            assert_eq!(sup.last_receipt_us(), Some(100));
        }
        assert_eq!(sup.stats().frames_discarded, 6);
    }

    #[test]
    fn serial_partial_frame_leaves_state_unchanged() {
        let mut sup = supervisor(TransportKind::Serial);
        let frame = encode_command(&ControlCommand::new(5, 6, 7, 8));
        port(&mut sup).push_rx(&frame[..9], None);

        assert_eq!(sup.poll(0), PollOutcome::NoFrame);
        assert!(sup.command().is_none());
        assert_eq!(sup.last_receipt_us(), None);
    }

    #[test]
    fn serial_resync_counted() {
        let mut sup = supervisor(TransportKind::Serial);
        let frame = encode_command(&ControlCommand::new(5, 6, 7, 8));
        let mut chunk = [0u8; 12];
        chunk[..2].copy_from_slice(&[0x01, 0x02]);
        chunk[2..].copy_from_slice(&frame);
        port(&mut sup).push_rx(&chunk, None);

        assert_eq!(sup.poll(0), PollOutcome::Accepted);
        assert_eq!(sup.stats().resync_bytes, 2);
    }

    #[test]
    fn stale_link_degrades_regardless_of_signal() {
        let mut sup = supervisor(TransportKind::Udp);
        port(&mut sup).rssi = Some(-30);
        port(&mut sup).push_rx(&ControlCommand::default().to_bytes(), Some(GCS));
        sup.poll(0);
        assert_eq!(sup.health(), LinkHealth::Healthy);

        sup.poll(1_000_000);
        assert_eq!(sup.health(), LinkHealth::Healthy);
        sup.poll(1_000_001);
        assert_eq!(sup.health(), LinkHealth::Degraded);
    }

    #[test]
    fn weak_signal_degrades_and_recovers_immediately() {
        let mut sup = supervisor(TransportKind::EspNow);
        port(&mut sup).rssi = Some(-90);
        port(&mut sup).push_rx(&ControlCommand::default().to_bytes(), None);
        sup.poll(0);
        assert_eq!(sup.health(), LinkHealth::Degraded);

        port(&mut sup).rssi = Some(-70);
        port(&mut sup).push_rx(&ControlCommand::default().to_bytes(), None);
        sup.poll(10_000);
        assert_eq!(sup.health(), LinkHealth::Healthy);
        assert_eq!(sup.stats().health_changes, 1);
    }

    #[test]
    fn disconnect_is_lost() {
        let mut sup = supervisor(TransportKind::Udp);
        port(&mut sup).push_rx(&ControlCommand::default().to_bytes(), Some(GCS));
        sup.poll(0);
        port(&mut sup).connectivity = Connectivity::Disconnected;
        sup.poll(10);
        assert_eq!(sup.health(), LinkHealth::Lost);
        // The last command is kept; acting on Lost is the failsafe's job
        assert!(sup.command().is_some());
    }

    #[test]
    fn receive_error_is_not_fatal() {
        let mut sup = supervisor(TransportKind::Udp);
        port(&mut sup).push_error(TransportError::IoError);
        assert_eq!(sup.poll(0), PollOutcome::NoFrame);
        assert_eq!(sup.stats().receive_errors, 1);
    }

    #[test]
    fn telemetry_waits_for_peer() {
        let mut sup = supervisor(TransportKind::Udp);
        let snapshot = SensorSnapshot::new();
        assert_eq!(sup.send_telemetry(&snapshot), Ok(TelemetryOutcome::Skipped));

        port(&mut sup).push_rx(&ControlCommand::default().to_bytes(), Some(GCS));
        sup.poll(0);
        assert_eq!(sup.send_telemetry(&snapshot), Ok(TelemetryOutcome::Sent));
        assert_eq!(sup.stats().telemetry_sent, 1);
        assert_eq!(sup.stats().telemetry_skipped, 1);
    }

    #[test]
    fn init_failure_reported() {
        let mut sup = supervisor(TransportKind::Udp);
        port(&mut sup).init_error = Some(TransportError::InitFailed);
        assert_eq!(sup.init(), Err(TransportError::InitFailed));
        assert_eq!(sup.transport().port().inits, 1);
    }
}
