//! Slave-side CAN receive loop and key unwrap for the key distribution
//! protocol.

mod error;
mod orchestrator;

pub use error::OrchestratorError;
pub use orchestrator::SlaveOrchestrator;
