//! Cryptographic utilities for credential storage
//!
//! The credentials namespace of plugin storage never holds plaintext.
//! Values are sealed with AES-256-GCM: a random 96-bit nonce is prepended
//! to the ciphertext and the whole blob is base64-encoded at rest.

use crate::core::error::{QuireError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

/// Seal a credential value with AES-256-GCM
///
/// # Arguments
/// * `value` - The plaintext credential
/// * `key` - 32-byte encryption key
///
/// # Returns
/// Base64-encoded string containing nonce + ciphertext
pub fn seal(value: &str, key: &[u8; 32]) -> Result<String> {
    let cipher = Aes256Gcm::new(key.into());

    let mut nonce_bytes = [0u8; 12];
    use aes_gcm::aead::rand_core::RngCore;
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, value.as_bytes())
        .map_err(|e| QuireError::Storage(format!("Encryption failed: {}", e)))?;

    let mut combined = nonce_bytes.to_vec();
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::STANDARD.encode(&combined))
}

/// Open a credential sealed by [`seal`]
///
/// # Arguments
/// * `sealed` - Base64-encoded string containing nonce + ciphertext
/// * `key` - 32-byte encryption key (must match the sealing key)
pub fn open(sealed: &str, key: &[u8; 32]) -> Result<String> {
    let cipher = Aes256Gcm::new(key.into());

    let combined = general_purpose::STANDARD
        .decode(sealed)
        .map_err(|e| QuireError::Storage(format!("Invalid sealed data: {}", e)))?;

    if combined.len() < 12 {
        return Err(QuireError::Storage("Invalid sealed data length".to_string()));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| QuireError::Storage(format!("Decryption failed: {}", e)))?;

    String::from_utf8(plaintext)
        .map_err(|e| QuireError::Storage(format!("Invalid UTF-8 in sealed data: {}", e)))
}

/// Derive a 32-byte key from an arbitrary secret string
///
/// Hosts that configure a passphrase rather than raw key material go
/// through this before constructing storage.
pub fn derive_key(secret: &str) -> [u8; 32] {
    let digest = Sha256::digest(secret.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        derive_key("quire-test-secret")
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = test_key();
        let original = "opds-password";

        let sealed = seal(original, &key).unwrap();
        let opened = open(&sealed, &key).unwrap();

        assert_eq!(original, opened);
    }

    #[test]
    fn test_sealed_value_is_not_plaintext() {
        let key = test_key();
        let sealed = seal("super-secret-token", &key).unwrap();
        assert!(!sealed.contains("super-secret-token"));
    }

    #[test]
    fn test_seal_produces_different_ciphertext() {
        let key = test_key();
        let value = "same_password";

        let sealed1 = seal(value, &key).unwrap();
        let sealed2 = seal(value, &key).unwrap();

        // Random nonce: same plaintext, different blobs
        assert_ne!(sealed1, sealed2);

        assert_eq!(open(&sealed1, &key).unwrap(), value);
        assert_eq!(open(&sealed2, &key).unwrap(), value);
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let key1 = test_key();
        let key2 = derive_key("a different secret");

        let sealed = seal("secret", &key1).unwrap();
        assert!(open(&sealed, &key2).is_err());
    }

    #[test]
    fn test_open_invalid_base64_fails() {
        let key = test_key();
        assert!(open("not_valid_base64!!!", &key).is_err());
    }

    #[test]
    fn test_open_too_short_data_fails() {
        let key = test_key();
        let short_data = general_purpose::STANDARD.encode([0u8; 5]);
        assert!(open(&short_data, &key).is_err());
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        assert_eq!(derive_key("abc"), derive_key("abc"));
        assert_ne!(derive_key("abc"), derive_key("abd"));
    }
}
