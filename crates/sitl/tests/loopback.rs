//! End-to-end tests over real loopback sockets.

use std::net::UdpSocket;
use std::time::Duration;

use tokio::sync::oneshot;

use wst_core::link::{
    LinkConfig, LinkHealth, LinkSupervisor, PollOutcome, TelemetryOutcome, Transport,
    TransportKind,
};
use wst_core::mixer::FrameType;
use wst_core::sensors::{SensorSnapshot, TELEMETRY_WIRE_SIZE};
use wst_core::ControlCommand;
use wst_sitl::{run, SitlConfig, UdpPort};

/// Poll until something other than `NoFrame` arrives or the attempts run out
fn poll_until_frame(link: &mut LinkSupervisor<UdpPort>, now_us: &mut u64) -> PollOutcome {
    for _ in 0..200 {
        *now_us += 1_000;
        match link.poll(*now_us) {
            PollOutcome::NoFrame => std::thread::sleep(Duration::from_millis(5)),
            outcome => return outcome,
        }
    }
    PollOutcome::NoFrame
}

#[test]
fn test_udp_command_and_telemetry_round_trip() {
    let port = UdpPort::bind("127.0.0.1:0").unwrap();
    let addr = port.local_addr().unwrap();
    let mut link = LinkSupervisor::new(Transport::new(TransportKind::Udp, port), LinkConfig::default());
    link.init().unwrap();

    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

    // No peer yet: telemetry is skipped
    let snapshot = SensorSnapshot {
        pitch: 150,
        voltage: 1260,
        ..SensorSnapshot::new()
    };
    assert_eq!(link.send_telemetry(&snapshot), Ok(TelemetryOutcome::Skipped));

    let command = ControlCommand::new(600, -200, 0, 0);
    client.send_to(&command.to_bytes(), addr).unwrap();

    let mut now_us = 0;
    assert_eq!(poll_until_frame(&mut link, &mut now_us), PollOutcome::Accepted);
    assert_eq!(link.command(), Some(&command));
    assert_eq!(link.health(), LinkHealth::Healthy);

    assert_eq!(link.send_telemetry(&snapshot), Ok(TelemetryOutcome::Sent));
    let mut buf = [0u8; 64];
    let (len, from) = client.recv_from(&mut buf).unwrap();
    assert_eq!(from, addr);
    assert_eq!(len, TELEMETRY_WIRE_SIZE);
    assert_eq!(SensorSnapshot::from_bytes(&buf[..len]), Some(snapshot));
}

#[test]
fn test_udp_wrong_length_is_discarded() {
    let port = UdpPort::bind("127.0.0.1:0").unwrap();
    let addr = port.local_addr().unwrap();
    let mut link = LinkSupervisor::new(Transport::new(TransportKind::Udp, port), LinkConfig::default());
    link.init().unwrap();

    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client.send_to(&[0u8; 9], addr).unwrap();

    let mut now_us = 0;
    assert_eq!(poll_until_frame(&mut link, &mut now_us), PollOutcome::Discarded);
    assert_eq!(link.command(), None);
    assert_eq!(link.stats().frames_discarded, 1);
    // A rejected datagram does not make its sender the telemetry peer
    assert_eq!(
        link.send_telemetry(&SensorSnapshot::new()),
        Ok(TelemetryOutcome::Skipped)
    );
}

#[tokio::test]
async fn test_run_drives_motors_from_udp() {
    let port = UdpPort::bind("127.0.0.1:0").unwrap();
    let addr = port.local_addr().unwrap();
    let config = SitlConfig {
        port: addr.port(),
        frame: FrameType::Differential,
        rate_hz: 200,
    };

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let shutdown = async {
        let _ = stop_rx.await;
    };

    let client = async move {
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let command = ControlCommand::new(300, 0, 0, 0);
        let mut buf = [0u8; 64];

        // Resend until telemetry comes back; the first datagram may land
        // before the loop's first tick
        let mut telemetry = None;
        for _ in 0..20 {
            socket.send_to(&command.to_bytes(), addr).await.unwrap();
            let recv = tokio::time::timeout(Duration::from_millis(250), socket.recv_from(&mut buf));
            if let Ok(Ok((len, _))) = recv.await {
                telemetry = SensorSnapshot::from_bytes(&buf[..len]);
                break;
            }
        }
        let _ = stop_tx.send(());
        telemetry
    };

    let (summary, telemetry) = tokio::join!(run(&config, port, shutdown, |_| {}), client);
    let summary = summary.unwrap();
    let telemetry = telemetry.expect("no telemetry received");

    assert!(summary.ticks > 0);
    assert!(summary.link.frames_accepted > 0);
    assert!(summary.link.telemetry_sent > 0);
    assert_eq!(summary.health, LinkHealth::Healthy);
    assert_eq!(summary.channels.motors, [300, 300]);
    assert_eq!(summary.channels.servos, None);
    // 12.6 V battery behind a 25 V divider
    assert!((telemetry.voltage - 1260).abs() <= 1, "{}", telemetry.voltage);
}
