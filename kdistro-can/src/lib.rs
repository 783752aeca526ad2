//! CAN fragmentation, reassembly, and the transport seam for the key
//! distribution protocol: one arbitration ID per logical stream, arrival
//! order rather than ID offset distinguishing start/data/end frames.

mod error;
mod frag;
mod frame;
mod ids;
mod link;
mod reassembler;
#[cfg(feature = "socketcan")]
mod socketcan_transport;

pub use error::CanError;
pub use frag::FragAssembler;
pub use frame::{CanFrame, CanTransport, LoopbackTransport};
pub use ids::CanIds;
pub use link::CanLink;
pub use reassembler::{LtkReassembler, StkReassembler};
#[cfg(feature = "socketcan")]
pub use socketcan_transport::SocketCanTransport;
