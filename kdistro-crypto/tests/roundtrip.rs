use kdistro_crypto::{CryptoError, MemCrypto};

#[test]
fn independent_instances_share_a_key() {
    let mut sender = MemCrypto::new();
    sender.initialize_with_key(&[42u8; 32]).unwrap();

    let mut receiver = MemCrypto::new();
    receiver.initialize_with_key(&[42u8; 32]).unwrap();

    let token = sender.encrypt(b"rotated stk").unwrap();
    let plain = receiver.decrypt(&token).unwrap();
    assert_eq!(plain, b"rotated stk");
}

#[test]
fn different_keys_cannot_cross_decrypt() {
    let mut sender = MemCrypto::new();
    sender.initialize_with_key(&[1u8; 32]).unwrap();

    let mut receiver = MemCrypto::new();
    receiver.initialize_with_key(&[2u8; 32]).unwrap();

    let token = sender.encrypt(b"secret").unwrap();
    let err = receiver.decrypt(&token).unwrap_err();
    assert!(matches!(err, CryptoError::Integrity));
}

#[test]
fn empty_plaintext_roundtrips() {
    let mut mc = MemCrypto::new();
    mc.initialize_with_key(&[5u8; 32]).unwrap();
    let token = mc.encrypt(b"").unwrap();
    let plain = mc.decrypt(&token).unwrap();
    assert!(plain.is_empty());
}
