//! Simulated serial link.
//!
//! An in-memory byte stream implementing [`TransportPort`]. Reads hand out
//! whatever is buffered, split at arbitrary points like a real UART FIFO,
//! so the serial framer sees partial frames.

use std::collections::VecDeque;

use wst_core::link::{Datagram, PeerAddr, TransportError, TransportPort};

/// Simulated UART with in-memory buffers.
#[derive(Debug)]
pub struct SimSerialPort {
    baud_rate: u32,
    rx_buffer: VecDeque<u8>,
    tx_buffer: Vec<u8>,
    /// Largest chunk handed out per receive
    chunk: usize,
    open: bool,
}

impl SimSerialPort {
    /// Default receive chunk in bytes.
    const DEFAULT_CHUNK: usize = 16;

    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            rx_buffer: VecDeque::new(),
            tx_buffer: Vec::new(),
            chunk: Self::DEFAULT_CHUNK,
            open: false,
        }
    }

    /// Limit how many bytes one receive returns.
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Inject data into the RX buffer (simulating received data).
    pub fn inject_rx_data(&mut self, data: &[u8]) {
        self.rx_buffer.extend(data);
    }

    /// Drain the TX buffer (simulating data being sent).
    pub fn drain_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx_buffer)
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl TransportPort for SimSerialPort {
    fn init(&mut self) -> Result<(), TransportError> {
        self.rx_buffer.clear();
        self.open = true;
        Ok(())
    }

    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<Datagram>, TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        let n = buf.len().min(self.chunk).min(self.rx_buffer.len());
        if n == 0 {
            return Ok(None);
        }
        for (dst, src) in buf.iter_mut().zip(self.rx_buffer.drain(..n)) {
            *dst = src;
        }
        Ok(Some(Datagram {
            len: n,
            source: None,
        }))
    }

    fn send(&mut self, _peer: Option<PeerAddr>, data: &[u8]) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        self.tx_buffer.extend_from_slice(data);
        Ok(data.len())
    }
}
