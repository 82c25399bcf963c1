//! UDP transport over a host socket.
//!
//! The socket is bound when the port is created, so callers can learn the
//! local address (useful with port 0) before the control loop starts.
//! `init` switches it to non-blocking mode; `try_receive` then never waits.

use std::io::ErrorKind;
use std::net::{SocketAddr, SocketAddrV4, ToSocketAddrs, UdpSocket};

use wst_core::link::{Connectivity, Datagram, PeerAddr, TransportError, TransportPort};

use crate::error::SitlError;

/// Non-blocking UDP socket implementing [`TransportPort`].
#[derive(Debug)]
pub struct UdpPort {
    socket: UdpSocket,
    connectivity: Connectivity,
}

impl UdpPort {
    /// Bind to `addr`.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, SitlError> {
        let socket = UdpSocket::bind(addr)?;
        Ok(Self {
            socket,
            connectivity: Connectivity::Connecting,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SitlError> {
        Ok(self.socket.local_addr()?)
    }
}

fn to_peer(addr: SocketAddr) -> Option<PeerAddr> {
    match addr {
        SocketAddr::V4(v4) => Some(PeerAddr::Ip(v4.ip().octets(), v4.port())),
        SocketAddr::V6(_) => None,
    }
}

fn from_peer(peer: PeerAddr) -> Option<SocketAddr> {
    match peer {
        PeerAddr::Ip(octets, port) => Some(SocketAddr::V4(SocketAddrV4::new(octets.into(), port))),
        PeerAddr::Mac(_) => None,
    }
}

impl TransportPort for UdpPort {
    fn init(&mut self) -> Result<(), TransportError> {
        self.socket
            .set_nonblocking(true)
            .map_err(|_| TransportError::InitFailed)?;
        self.connectivity = Connectivity::Connected;
        Ok(())
    }

    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<Datagram>, TransportError> {
        match self.socket.recv_from(buf) {
            Ok((len, from)) => Ok(Some(Datagram {
                len,
                source: to_peer(from),
            })),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(_) => Err(TransportError::IoError),
        }
    }

    fn send(&mut self, peer: Option<PeerAddr>, data: &[u8]) -> Result<usize, TransportError> {
        let target = peer.and_then(from_peer).ok_or(TransportError::IoError)?;
        match self.socket.send_to(data, target) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(TransportError::Timeout),
            Err(_) => Err(TransportError::IoError),
        }
    }

    fn connectivity(&self) -> Connectivity {
        self.connectivity
    }
}
