//! Error types for `kdistro-slave`.

use std::fmt;

use kdistro_can::CanError;
use kdistro_crypto::CryptoError;
use kdistro_tpm::TpmError;

#[derive(Debug)]
pub enum OrchestratorError {
    Tpm(TpmError),
    Can(CanError),
    Crypto(CryptoError),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tpm(e) => write!(f, "TPM error: {e}"),
            Self::Can(e) => write!(f, "CAN error: {e}"),
            Self::Crypto(e) => write!(f, "crypto error: {e}"),
        }
    }
}

impl std::error::Error for OrchestratorError {}

impl From<TpmError> for OrchestratorError {
    fn from(e: TpmError) -> Self {
        Self::Tpm(e)
    }
}

impl From<CanError> for OrchestratorError {
    fn from(e: CanError) -> Self {
        Self::Can(e)
    }
}

impl From<CryptoError> for OrchestratorError {
    fn from(e: CryptoError) -> Self {
        Self::Crypto(e)
    }
}
