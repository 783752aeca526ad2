//! Fernet token encode/decode.
//!
//! Wire layout (matches `cryptography.fernet.Fernet`):
//!
//! ```text
//! token = base64url( version(1) || timestamp_be(8) || iv(16) || ciphertext || tag(32) )
//! ```
//!
//! `ciphertext` is AES-128-CBC (PKCS#7) under the key's encryption half;
//! `tag` is HMAC-SHA256 over everything preceding it, under the key's
//! signing half. A 256-bit Fernet key splits into signing half (bytes 0..16)
//! and encryption half (bytes 16..32).

use aes::Aes128;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::CryptoError;

const VERSION: u8 = 0x80;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 32;
const HEADER_LEN: usize = 1 + 8 + IV_LEN;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// The two 128-bit halves of a 256-bit Fernet key.
pub struct FernetKey {
    pub signing: [u8; 16],
    pub encrypting: [u8; 16],
}

impl FernetKey {
    pub fn from_raw(raw: &[u8; 32]) -> Self {
        let mut signing = [0u8; 16];
        let mut encrypting = [0u8; 16];
        signing.copy_from_slice(&raw[0..16]);
        encrypting.copy_from_slice(&raw[16..32]);
        Self { signing, encrypting }
    }
}

/// Seal `plaintext` under `key`, using `iv` and `timestamp` (unix seconds).
/// Separated from [`encrypt_now`] so tests can supply deterministic IVs.
pub fn encrypt_with(key: &FernetKey, iv: [u8; 16], timestamp: u64, plaintext: &[u8]) -> Vec<u8> {
    let mut buf = plaintext.to_vec();
    let pad_len = 16 - (buf.len() % 16);
    buf.resize(buf.len() + pad_len, 0);
    let ct_len = buf.len() - pad_len;

    let ciphertext = Aes128CbcEnc::new(&key.encrypting.into(), &iv.into())
        .encrypt_padded_mut::<cbc::cipher::block_padding::Pkcs7>(&mut buf, ct_len)
        .expect("buffer sized for padding")
        .to_vec();

    let mut payload = Vec::with_capacity(HEADER_LEN + ciphertext.len() + TAG_LEN);
    payload.push(VERSION);
    payload.extend_from_slice(&timestamp.to_be_bytes());
    payload.extend_from_slice(&iv);
    payload.extend_from_slice(&ciphertext);

    let mut mac = HmacSha256::new_from_slice(&key.signing).expect("HMAC accepts any key length");
    mac.update(&payload);
    let tag = mac.finalize().into_bytes();
    payload.extend_from_slice(&tag);

    payload
}

/// Seal `plaintext` under `key` with a fresh random IV and the current time.
pub fn encrypt_now(key: &FernetKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut iv = [0u8; 16];
    getrandom::getrandom(&mut iv).map_err(|_| CryptoError::Integrity)?;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(encrypt_with(key, iv, timestamp, plaintext))
}

/// Open a token, verifying the tag before touching the ciphertext.
pub fn decrypt(key: &FernetKey, token: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if token.len() < HEADER_LEN + TAG_LEN {
        return Err(CryptoError::MalformedToken);
    }
    if token[0] != VERSION {
        return Err(CryptoError::MalformedToken);
    }

    let (signed, tag) = token.split_at(token.len() - TAG_LEN);

    let mut mac = HmacSha256::new_from_slice(&key.signing).expect("HMAC accepts any key length");
    mac.update(signed);
    let expected = mac.finalize().into_bytes();
    if expected.as_slice().ct_eq(tag).unwrap_u8() != 1 {
        return Err(CryptoError::Integrity);
    }

    let iv = &signed[9..9 + IV_LEN];
    let ciphertext = &signed[HEADER_LEN..];
    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(CryptoError::Integrity);
    }

    let mut buf = ciphertext.to_vec();
    let plaintext = Aes128CbcDec::new(&key.encrypting.into(), iv.try_into().unwrap())
        .decrypt_padded_mut::<cbc::cipher::block_padding::Pkcs7>(&mut buf)
        .map_err(|_| CryptoError::Integrity)?;

    Ok(plaintext.to_vec())
}
