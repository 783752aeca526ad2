//! Higher-level reassembly state machines built on [`FragAssembler`],
//! grounded in `slave_core/ltk_proc.py` and `slave_core/stk_proc.py`.

use crate::error::CanError;
use crate::frag::FragAssembler;
use crate::frame::CanFrame;

/// Reassembles an LTK delivery: a wrapped-public-key stream and a
/// signature stream, each its own arbitration ID. Completes once both
/// halves have arrived, in either order.
pub struct LtkReassembler {
    pub_asm: FragAssembler,
    sig_asm: FragAssembler,
    pub_data: Option<Vec<u8>>,
    sig_data: Option<Vec<u8>>,
}

impl LtkReassembler {
    pub fn new(pub_id: u32, sig_id: u32) -> Self {
        Self {
            pub_asm: FragAssembler::new(pub_id),
            sig_asm: FragAssembler::new(sig_id),
            pub_data: None,
            sig_data: None,
        }
    }

    pub fn pub_id(&self) -> u32 {
        self.pub_asm.id()
    }

    pub fn sig_id(&self) -> u32 {
        self.sig_asm.id()
    }

    /// Feed one frame. Returns `Some((wrapped_pub, signature))` once both
    /// streams have independently completed.
    pub fn on_frame(&mut self, frame: &CanFrame) -> Result<Option<(Vec<u8>, Vec<u8>)>, CanError> {
        if frame.id == self.pub_asm.id() {
            if let Some(data) = self.pub_asm.on_frame(frame)? {
                self.pub_data = Some(data);
            }
        } else if frame.id == self.sig_asm.id() {
            if let Some(data) = self.sig_asm.on_frame(frame)? {
                self.sig_data = Some(data);
            }
        } else {
            return Ok(None);
        }

        if self.pub_data.is_some() && self.sig_data.is_some() {
            Ok(Some((self.pub_data.take().unwrap(), self.sig_data.take().unwrap())))
        } else {
            Ok(None)
        }
    }
}

/// Reassembles an STK delivery: a single wrapped-and-signed envelope on one
/// arbitration ID.
pub struct StkReassembler {
    asm: FragAssembler,
}

impl StkReassembler {
    pub fn new(id: u32) -> Self {
        Self {
            asm: FragAssembler::new(id),
        }
    }

    pub fn id(&self) -> u32 {
        self.asm.id()
    }

    pub fn on_frame(&mut self, frame: &CanFrame) -> Result<Option<Vec<u8>>, CanError> {
        if frame.id != self.asm.id() {
            return Ok(None);
        }
        self.asm.on_frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u32, data: &[u8]) -> CanFrame {
        CanFrame::new(id, data.to_vec()).unwrap()
    }

    #[test]
    fn ltk_completes_only_after_both_streams_finish() {
        let mut r = LtkReassembler::new(0x10, 0x20);

        r.on_frame(&frame(0x10, &1u16.to_le_bytes())).unwrap();
        r.on_frame(&frame(0x10, b"P")).unwrap();
        let still_waiting = r.on_frame(&frame(0x10, &[])).unwrap();
        assert!(still_waiting.is_none());

        r.on_frame(&frame(0x20, &1u16.to_le_bytes())).unwrap();
        r.on_frame(&frame(0x20, b"S")).unwrap();
        let done = r.on_frame(&frame(0x20, &[])).unwrap();
        assert_eq!(done, Some((b"P".to_vec(), b"S".to_vec())));
    }

    #[test]
    fn stk_completes_on_its_own_id() {
        let mut r = StkReassembler::new(0x30);
        r.on_frame(&frame(0x30, &1u16.to_le_bytes())).unwrap();
        r.on_frame(&frame(0x30, b"K")).unwrap();
        let done = r.on_frame(&frame(0x30, &[])).unwrap();
        assert_eq!(done, Some(b"K".to_vec()));
    }
}
