//! Single-arbitration-ID fragment reassembly.
//!
//! One logical stream, one CAN ID. Arrival order — not ID offset — tells
//! start from data from end: the first frame after idle carries a 2-byte
//! little-endian fragment count (the start frame), every frame after that
//! up to 8 payload bytes is a data fragment, and a zero-length frame is the
//! end sentinel. This supersedes the original `KeyFragMngr`, which spread a
//! stream across a 50-ID range and used the numeric offset from a start ID
//! to address each fragment's position.

use crate::error::CanError;
use crate::frame::CanFrame;

#[derive(Debug)]
enum State {
    Idle,
    Collecting { expected: usize, received: Vec<Vec<u8>> },
}

/// Reassembles one CAN ID's fragment stream into complete payloads.
#[derive(Debug)]
pub struct FragAssembler {
    id: u32,
    state: State,
}

impl FragAssembler {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            state: State::Idle,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Feed one frame already known to belong to this stream's arbitration
    /// ID. Returns `Some(payload)` the instant the end sentinel closes a
    /// complete sequence; `None` while still collecting.
    pub fn on_frame(&mut self, frame: &CanFrame) -> Result<Option<Vec<u8>>, CanError> {
        match &mut self.state {
            State::Idle => {
                let expected = Self::parse_start(&frame.data);
                self.state = State::Collecting {
                    expected,
                    received: Vec::with_capacity(expected),
                };
                Ok(None)
            }
            State::Collecting { expected, received } => {
                // Completion is positional: once the data window is full, the
                // next frame closes the sequence regardless of whether it's
                // the empty end-sentinel or any other frame that happens to
                // arrive after the window.
                if received.len() >= *expected {
                    let mut out = Vec::new();
                    for chunk in received.drain(..) {
                        out.extend(chunk);
                    }
                    self.state = State::Idle;
                    return Ok(Some(out));
                }
                if frame.data.is_empty() {
                    let (expected, received) = (*expected, received.len());
                    self.state = State::Idle;
                    return Err(CanError::IncompleteSequence { expected, received });
                }
                received.push(frame.data.clone());
                Ok(None)
            }
        }
    }

    fn parse_start(data: &[u8]) -> usize {
        let mut buf = [0u8; 2];
        let n = data.len().min(2);
        buf[..n].copy_from_slice(&data[..n]);
        u16::from_le_bytes(buf) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(id: u32, count: u16) -> CanFrame {
        CanFrame::new(id, count.to_le_bytes().to_vec()).unwrap()
    }

    fn data(id: u32, bytes: &[u8]) -> CanFrame {
        CanFrame::new(id, bytes.to_vec()).unwrap()
    }

    fn end(id: u32) -> CanFrame {
        CanFrame::new(id, vec![]).unwrap()
    }

    #[test]
    fn reassembles_a_multi_fragment_payload() {
        let mut asm = FragAssembler::new(0x100);
        let payload = b"0123456789abcdef0";
        let frag_count = (payload.len() as f64 / 8.0).ceil() as u16;

        assert!(asm.on_frame(&start(0x100, frag_count)).unwrap().is_none());
        for chunk in payload.chunks(8) {
            assert!(asm.on_frame(&data(0x100, chunk)).unwrap().is_none());
        }
        let result = asm.on_frame(&end(0x100)).unwrap();
        assert_eq!(result.unwrap(), payload);
    }

    #[test]
    fn empty_payload_completes_immediately_after_start() {
        let mut asm = FragAssembler::new(0x200);
        assert!(asm.on_frame(&start(0x200, 0)).unwrap().is_none());
        let result = asm.on_frame(&end(0x200)).unwrap();
        assert_eq!(result.unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn premature_end_is_rejected_and_resets() {
        let mut asm = FragAssembler::new(0x300);
        asm.on_frame(&start(0x300, 2)).unwrap();
        asm.on_frame(&data(0x300, b"1234")).unwrap();
        let err = asm.on_frame(&end(0x300)).unwrap_err();
        assert!(matches!(err, CanError::IncompleteSequence { expected: 2, received: 1 }));

        // State resets to idle, ready for the next sequence.
        assert!(asm.on_frame(&start(0x300, 0)).unwrap().is_none());
        assert_eq!(asm.on_frame(&end(0x300)).unwrap().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn any_frame_after_the_data_window_completes_the_sequence() {
        let mut asm = FragAssembler::new(0x400);
        asm.on_frame(&start(0x400, 1)).unwrap();
        asm.on_frame(&data(0x400, b"a")).unwrap();
        // A non-empty frame arriving after the window is full still closes
        // the sequence positionally; its own payload is not appended.
        let result = asm.on_frame(&data(0x400, b"b")).unwrap();
        assert_eq!(result.unwrap(), b"a");
    }

    #[test]
    fn exact_multiple_of_eight_needs_no_short_final_fragment() {
        let mut asm = FragAssembler::new(0x500);
        let payload = vec![0xABu8; 64];
        asm.on_frame(&start(0x500, 8)).unwrap();
        for chunk in payload.chunks(8) {
            asm.on_frame(&data(0x500, chunk)).unwrap();
        }
        let result = asm.on_frame(&end(0x500)).unwrap().unwrap();
        assert_eq!(result, payload);
    }
}
