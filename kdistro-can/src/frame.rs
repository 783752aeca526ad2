//! CAN frame representation and the transport seam, grounded in
//! `slave_core/pycan.py`'s thin wrapper around `python-can`'s `Bus`.

use crate::error::CanError;

/// One CAN frame: an extended (29-bit) arbitration ID and up to 8 payload
/// bytes. Extended IDs only, per the source (`is_extended_id=True`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    pub id: u32,
    pub data: Vec<u8>,
}

impl CanFrame {
    pub fn new(id: u32, data: Vec<u8>) -> Result<Self, CanError> {
        if data.len() > 8 {
            return Err(CanError::FrameTooLarge { len: data.len() });
        }
        Ok(Self { id, data })
    }
}

/// Abstraction over a CAN bus handle. Production code plugs in a
/// `socketcan`-backed implementation (Linux-only, feature-gated); tests use
/// [`LoopbackTransport`].
pub trait CanTransport {
    fn send(&mut self, frame: CanFrame) -> Result<(), CanError>;

    /// Block for up to `timeout_ms` waiting for the next frame; `None` on
    /// timeout, matching `Bus.recv(0.1)`'s `None`-on-timeout contract.
    fn recv(&mut self, timeout_ms: u64) -> Result<Option<CanFrame>, CanError>;
}

/// An in-process transport that delivers sent frames back to its own
/// receive queue, in order. Used by tests and by the fragment round-trip
/// integration tests.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    queue: std::collections::VecDeque<CanFrame>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CanTransport for LoopbackTransport {
    fn send(&mut self, frame: CanFrame) -> Result<(), CanError> {
        self.queue.push_back(frame);
        Ok(())
    }

    fn recv(&mut self, _timeout_ms: u64) -> Result<Option<CanFrame>, CanError> {
        Ok(self.queue.pop_front())
    }
}
