//! `MemCrypto`: a write-once Fernet-compatible symmetric envelope.
//!
//! A fresh `MemCrypto` holds no key. Either [`MemCrypto::generate_key`] or
//! [`MemCrypto::initialize_with_key`] may seed it exactly once; every
//! subsequent seed attempt is rejected with [`CryptoError::AlreadyInitialized`].
//! This mirrors the one-shot LTK/STK lifetime in the source: a key is minted
//! or imported once, used for the lifetime of that rotation, then discarded.

use base64::Engine;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::token::{self, FernetKey};

const KEY_LEN: usize = 32;

/// Symmetric encrypt/decrypt envelope, keyed at most once.
pub struct MemCrypto {
    key: Option<[u8; KEY_LEN]>,
}

impl MemCrypto {
    /// An unkeyed instance. Call [`Self::generate_key`] or
    /// [`Self::initialize_with_key`] before use.
    pub fn new() -> Self {
        Self { key: None }
    }

    /// Mint a fresh 256-bit key, base64url-encode it (matching
    /// `base64.urlsafe_b64encode` in the source), and seed this instance
    /// with it. Returns the encoded key so the caller can hand it to a
    /// TPM-sealed export.
    pub fn generate_key(&mut self) -> Result<String, CryptoError> {
        let mut raw = [0u8; KEY_LEN];
        getrandom::getrandom(&mut raw).map_err(|_| CryptoError::Integrity)?;
        let encoded = base64::engine::general_purpose::URL_SAFE.encode(raw);
        self.initialize_with_key(&raw)?;
        raw.zeroize();
        Ok(encoded)
    }

    /// Seed this instance with an externally supplied 256-bit raw key.
    /// Write-once: fails if this instance already holds a key.
    pub fn initialize_with_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        if self.key.is_some() {
            return Err(CryptoError::AlreadyInitialized);
        }
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                got: key.len(),
            });
        }
        let mut raw = [0u8; KEY_LEN];
        raw.copy_from_slice(key);
        self.key = Some(raw);
        Ok(())
    }

    fn fernet_key(&self) -> Result<FernetKey, CryptoError> {
        let raw = self.key.ok_or(CryptoError::NotInitialized)?;
        Ok(FernetKey::from_raw(&raw))
    }

    /// Seal `plaintext` into a base64url Fernet token.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.fernet_key()?;
        let raw_token = token::encrypt_now(&key, plaintext)?;
        Ok(base64::engine::general_purpose::URL_SAFE.encode(raw_token).into_bytes())
    }

    /// Open a base64url Fernet token produced by [`Self::encrypt`].
    /// Fails closed with [`CryptoError::Integrity`] on any tag mismatch,
    /// padding failure, or malformed envelope.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.fernet_key()?;
        let raw_token = base64::engine::general_purpose::URL_SAFE
            .decode(ciphertext)
            .map_err(|_| CryptoError::MalformedToken)?;
        token::decrypt(&key, &raw_token)
    }
}

/// Mint a fresh, independent 256-bit key and return it base64url-encoded,
/// matching `MemCrypto.gen_mem_key`'s bare `Fernet.generate_key()` call —
/// unlike [`MemCrypto::generate_key`], this does not touch any instance's
/// own key. Used to mint STK material that is then wrapped with the LTK's
/// `MemCrypto` instance, not with its own.
pub fn mint_key_material() -> Result<Vec<u8>, CryptoError> {
    let mut raw = [0u8; KEY_LEN];
    getrandom::getrandom(&mut raw).map_err(|_| CryptoError::Integrity)?;
    let encoded = base64::engine::general_purpose::URL_SAFE.encode(raw).into_bytes();
    raw.zeroize();
    Ok(encoded)
}

impl Default for MemCrypto {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemCrypto {
    fn drop(&mut self) {
        if let Some(ref mut raw) = self.key {
            raw.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_then_roundtrip() {
        let mut mc = MemCrypto::new();
        mc.generate_key().unwrap();
        let token = mc.encrypt(b"hello stk").unwrap();
        let plain = mc.decrypt(&token).unwrap();
        assert_eq!(plain, b"hello stk");
    }

    #[test]
    fn initialize_with_key_then_roundtrip() {
        let mut mc = MemCrypto::new();
        mc.initialize_with_key(&[0u8; 32]).unwrap();
        let token = mc.encrypt(b"ltk payload").unwrap();
        let plain = mc.decrypt(&token).unwrap();
        assert_eq!(plain, b"ltk payload");
    }

    #[test]
    fn write_once_rejects_second_init() {
        let mut mc = MemCrypto::new();
        mc.initialize_with_key(&[1u8; 32]).unwrap();
        let err = mc.initialize_with_key(&[2u8; 32]).unwrap_err();
        assert!(matches!(err, CryptoError::AlreadyInitialized));
    }

    #[test]
    fn generate_key_also_respects_write_once() {
        let mut mc = MemCrypto::new();
        mc.generate_key().unwrap();
        let err = mc.generate_key().unwrap_err();
        assert!(matches!(err, CryptoError::AlreadyInitialized));
    }

    #[test]
    fn rejects_wrong_key_length() {
        let mut mc = MemCrypto::new();
        let err = mc.initialize_with_key(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidKeyLength {
                expected: 32,
                got: 16
            }
        ));
    }

    #[test]
    fn decrypt_before_init_fails() {
        let mc = MemCrypto::new();
        let err = mc.decrypt(b"anything").unwrap_err();
        assert!(matches!(err, CryptoError::NotInitialized));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut mc = MemCrypto::new();
        mc.initialize_with_key(&[7u8; 32]).unwrap();
        let mut token = mc.encrypt(b"short term key").unwrap();
        let last = token.len() - 1;
        token[last] ^= 0x01;
        let err = mc.decrypt(&token).unwrap_err();
        assert!(matches!(err, CryptoError::Integrity));
    }

    #[test]
    fn malformed_base64_is_rejected() {
        let mut mc = MemCrypto::new();
        mc.initialize_with_key(&[9u8; 32]).unwrap();
        let err = mc.decrypt(b"not valid base64url!!").unwrap_err();
        assert!(matches!(err, CryptoError::MalformedToken));
    }

    #[test]
    fn mint_key_material_is_independent_of_instance_state() {
        let mut mc = MemCrypto::new();
        mc.initialize_with_key(&[3u8; 32]).unwrap();
        let a = mint_key_material().unwrap();
        let b = mint_key_material().unwrap();
        assert_ne!(a, b);
        // The instance's own key is untouched; it still works.
        let token = mc.encrypt(b"still keyed").unwrap();
        assert_eq!(mc.decrypt(&token).unwrap(), b"still keyed");
    }

    #[test]
    fn zero_key_known_vector_roundtrip() {
        // Scenario 2 of the testable-properties section: an all-zero LTK
        // must still produce a valid, independently verifiable token.
        let mut mc = MemCrypto::new();
        mc.initialize_with_key(&[0u8; 32]).unwrap();
        let key = FernetKey::from_raw(&[0u8; 32]);
        let raw = token::encrypt_with(&key, [0u8; 16], 0, b"stk-seed");
        let opened = token::decrypt(&key, &raw).unwrap();
        assert_eq!(opened, b"stk-seed");
    }
}
