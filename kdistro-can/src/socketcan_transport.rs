//! Production [`CanTransport`] over Linux SocketCAN, grounded in
//! `slave_core/pycan.py`'s `can.interface.Bus(bustype='socketcan')`.

use socketcan::{CanFrame as SysFrame, ExtendedId, Frame, Socket};

use crate::error::CanError;
use crate::frame::{CanFrame, CanTransport};

pub struct SocketCanTransport {
    socket: socketcan::CanSocket,
}

impl SocketCanTransport {
    pub fn open(channel: &str) -> Result<Self, CanError> {
        let socket = socketcan::CanSocket::open(channel).map_err(|e| CanError::Transport(e.to_string()))?;
        Ok(Self { socket })
    }
}

impl CanTransport for SocketCanTransport {
    fn send(&mut self, frame: CanFrame) -> Result<(), CanError> {
        let id = ExtendedId::new(frame.id).ok_or(CanError::FrameTooLarge { len: frame.data.len() })?;
        let sys_frame =
            SysFrame::new(id, &frame.data).ok_or(CanError::FrameTooLarge { len: frame.data.len() })?;
        self.socket
            .write_frame(&sys_frame)
            .map_err(|e| CanError::Transport(e.to_string()))
    }

    fn recv(&mut self, timeout_ms: u64) -> Result<Option<CanFrame>, CanError> {
        self.socket
            .set_read_timeout(std::time::Duration::from_millis(timeout_ms))
            .map_err(|e| CanError::Transport(e.to_string()))?;
        match self.socket.read_frame() {
            Ok(SysFrame::Data(data_frame)) => Ok(Some(CanFrame::new(
                data_frame.raw_id(),
                data_frame.data().to_vec(),
            )?)),
            Ok(_) => Ok(None),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(CanError::Transport(e.to_string())),
        }
    }
}
