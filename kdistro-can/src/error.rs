//! Error types for `kdistro-can`.

use std::fmt;

#[derive(Debug)]
pub enum CanError {
    /// Transport layer could not send or receive a frame.
    Transport(String),
    /// A frame arrived with more than 8 data bytes, or a payload passed to
    /// the sender doesn't fit an `extended_id`'s arbitration space.
    FrameTooLarge { len: usize },
    /// A data or end frame arrived before a start frame initialized the
    /// assembler for that arbitration ID.
    NotCollecting,
    /// The end frame arrived before every promised fragment was seen.
    IncompleteSequence { expected: usize, received: usize },
}

impl fmt::Display for CanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "CAN transport error: {msg}"),
            Self::FrameTooLarge { len } => write!(f, "frame payload too large: {len} bytes"),
            Self::NotCollecting => write!(f, "fragment received with no active start frame"),
            Self::IncompleteSequence { expected, received } => write!(
                f,
                "end frame arrived after only {received} of {expected} fragments"
            ),
        }
    }
}

impl std::error::Error for CanError {}
