//! Error types for `kdistro-crypto`.

use std::fmt;

/// Failures from [`crate::MemCrypto`].
#[derive(Debug)]
pub enum CryptoError {
    /// `initialize_with_key`/`generate_key` called on an instance that is
    /// already initialized.
    AlreadyInitialized,
    /// Encrypt/decrypt called before the instance holds a key.
    NotInitialized,
    /// The raw key was not exactly 256 bits.
    InvalidKeyLength { expected: usize, got: usize },
    /// Token is too short, has the wrong version byte, or fails base64url
    /// decoding.
    MalformedToken,
    /// HMAC tag mismatch or AES-CBC unpadding failure. Deliberately does not
    /// distinguish the two — an attacker must not learn which check failed.
    Integrity,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "crypto instance already initialized"),
            Self::NotInitialized => write!(f, "crypto instance not initialized"),
            Self::InvalidKeyLength { expected, got } => {
                write!(f, "invalid key length: expected {expected} bytes, got {got}")
            }
            Self::MalformedToken => write!(f, "malformed token"),
            Self::Integrity => write!(f, "integrity check failed"),
        }
    }
}

impl std::error::Error for CryptoError {}
