//! Key custody: AES-256-GCM encryption of signing credentials at rest.
//!
//! # Wire format
//! ```text
//! hex( nonce (12 bytes) || ciphertext + auth_tag )
//! ```
//!
//! # Design Decisions
//! - Fresh random nonce per encryption, so the same credential never
//!   encrypts to the same ciphertext twice
//! - Decryption fails closed: tampering, truncation, or a wrong key yield
//!   [`CustodyError`], never garbage plaintext
//! - The 32-byte master key is loaded from configuration or secret
//!   storage; this module never generates one
//! - The interface is two calls wide so a KMS/HSM-backed implementation
//!   can replace it without touching callers

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use thiserror::Error;

/// Master key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Minimum ciphertext size: nonce plus the authentication tag.
const MIN_CIPHERTEXT_LEN: usize = NONCE_LEN + 16;

/// Errors from credential encryption or decryption.
#[derive(Debug, Error, PartialEq)]
pub enum CustodyError {
    #[error("master key must be {KEY_LEN} bytes, got {0}")]
    KeyLength(usize),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("ciphertext too short: {0} bytes")]
    Truncated(usize),

    #[error("encryption failed")]
    Encrypt,

    /// Authentication failed: wrong key, or the ciphertext was tampered
    /// with.
    #[error("decryption failed")]
    Decrypt,

    #[error("decrypted credential is not valid UTF-8")]
    Utf8,
}

/// Symmetric encryption of wallet signing credentials.
#[derive(Clone)]
pub struct KeyCustody {
    cipher: Aes256Gcm,
}

impl KeyCustody {
    /// Build from a raw 32-byte master key.
    pub fn new(key: &[u8]) -> Result<Self, CustodyError> {
        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|_| CustodyError::KeyLength(key.len()))?;
        Ok(Self { cipher })
    }

    /// Build from a hex-encoded master key, as carried in configuration.
    pub fn from_hex(hex_key: &str) -> Result<Self, CustodyError> {
        let key = hex::decode(hex_key)?;
        Self::new(&key)
    }

    /// Encrypt a credential. Returns `hex(nonce || ciphertext+tag)`.
    pub fn encrypt(&self, credential: &str) -> Result<String, CustodyError> {
        use rand::RngCore;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, credential.as_bytes())
            .map_err(|_| CustodyError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    /// Decrypt a credential produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, encrypted_hex: &str) -> Result<String, CustodyError> {
        let data = hex::decode(encrypted_hex)?;
        if data.len() < MIN_CIPHERTEXT_LEN {
            return Err(CustodyError::Truncated(data.len()));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CustodyError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CustodyError::Utf8)
    }
}

impl std::fmt::Debug for KeyCustody {
    // Never expose key material through Debug.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCustody").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custody() -> KeyCustody {
        KeyCustody::new(&[7u8; KEY_LEN]).unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let custody = custody();
        let credential = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

        let encrypted = custody.encrypt(credential).unwrap();
        let decrypted = custody.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, credential);
    }

    #[test]
    fn empty_credential_roundtrips() {
        let custody = custody();
        let encrypted = custody.encrypt("").unwrap();
        assert_eq!(custody.decrypt(&encrypted).unwrap(), "");
    }

    #[test]
    fn encryption_is_probabilistic() {
        let custody = custody();
        let a = custody.encrypt("same credential").unwrap();
        let b = custody.encrypt("same credential").unwrap();
        assert_ne!(a, b);
        assert_eq!(custody.decrypt(&a).unwrap(), custody.decrypt(&b).unwrap());
    }

    #[test]
    fn wrong_key_fails() {
        let encrypted = custody().encrypt("secret").unwrap();
        let other = KeyCustody::new(&[8u8; KEY_LEN]).unwrap();
        assert_eq!(other.decrypt(&encrypted), Err(CustodyError::Decrypt));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let custody = custody();
        let encrypted = custody.encrypt("secret").unwrap();

        let mut bytes = hex::decode(&encrypted).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        assert_eq!(
            custody.decrypt(&hex::encode(bytes)),
            Err(CustodyError::Decrypt)
        );
    }

    #[test]
    fn tampered_nonce_fails() {
        let custody = custody();
        let encrypted = custody.encrypt("secret").unwrap();

        let mut bytes = hex::decode(&encrypted).unwrap();
        bytes[0] ^= 0xFF;

        assert_eq!(
            custody.decrypt(&hex::encode(bytes)),
            Err(CustodyError::Decrypt)
        );
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let custody = custody();
        assert_eq!(custody.decrypt("00ff00"), Err(CustodyError::Truncated(3)));
    }

    #[test]
    fn non_hex_ciphertext_fails() {
        let custody = custody();
        assert!(matches!(
            custody.decrypt("not hex at all"),
            Err(CustodyError::Hex(_))
        ));
    }

    #[test]
    fn bad_key_length_rejected() {
        assert_eq!(
            KeyCustody::new(&[0u8; 16]).unwrap_err(),
            CustodyError::KeyLength(16)
        );
        assert!(KeyCustody::from_hex("abcd").is_err());
    }

    #[test]
    fn from_hex_matches_raw_key() {
        let key = [9u8; KEY_LEN];
        let a = KeyCustody::new(&key).unwrap();
        let b = KeyCustody::from_hex(&hex::encode(key)).unwrap();

        let encrypted = a.encrypt("credential").unwrap();
        assert_eq!(b.decrypt(&encrypted).unwrap(), "credential");
    }
}
