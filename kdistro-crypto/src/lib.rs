//! Fernet-compatible symmetric envelope used to wrap the STK before it goes
//! out over CAN, and to protect LTK/STK material at rest. Produces tokens
//! byte-compatible with `cryptography.fernet.Fernet`: version byte, 8-byte
//! big-endian timestamp, 16-byte IV, AES-128-CBC/PKCS7 ciphertext, and a
//! 32-byte HMAC-SHA256 tag, all base64url-encoded.

mod error;
mod mem_crypto;
mod token;

pub use error::CryptoError;
pub use mem_crypto::{mint_key_material, MemCrypto};
pub use token::FernetKey;
