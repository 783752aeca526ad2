//! TPM 2.0 integration for the CAN key distribution protocol: a thin
//! subprocess gateway over `tpm2-tools`, and an ordinal-indexed registry of
//! external public keys and TPM-sealed symmetric keys.

mod error;
mod gateway;
mod keystore;
mod paths;
mod scratch;
mod types;

pub use error::TpmError;
pub use gateway::TpmGateway;
pub use keystore::KeyStore;
pub use paths::ContextLayout;
pub use types::{ExtKeyOrdinal, SealedKeyOrdinal};
