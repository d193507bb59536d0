//! Content encryption using ChaCha20-Poly1305
//!
//! This module provides symmetric encryption for file data. One process-wide
//! `Secret` seals every upload; the encrypted format is self-describing so a
//! blob can be opened knowing only the key that sealed it.

use std::ops::Deref;

use chacha20poly1305::Key;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Serialize};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of ChaCha20-Poly1305 key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("invalid secret size, expected {expected}, got {got}")]
    InvalidKeySize { expected: usize, got: usize },
    #[error("failed to generate nonce: {0}")]
    NonceGeneration(String),
    #[error("encrypt error")]
    Encrypt,
    /// Ciphertext too short to carry a nonce, or authentication failed.
    /// Either way the input is not a blob this key sealed.
    #[error("ciphertext integrity check failed")]
    Integrity,
}

/// A 256-bit symmetric encryption key for content encryption
///
/// The encrypted format is: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
/// A fresh random nonce is generated per encryption call and prepended to the
/// output, so decryption is self-describing.
///
/// # Examples
///
/// ```ignore
/// let secret = Secret::generate();
///
/// let plaintext = b"sensitive data";
/// let ciphertext = secret.encrypt(plaintext)?;
///
/// let recovered = secret.decrypt(&ciphertext)?;
/// assert_eq!(plaintext, &recovered[..]);
/// ```
#[derive(PartialEq, Clone, Serialize, Deserialize)]
pub struct Secret([u8; SECRET_SIZE]);

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

// Key material stays out of logs and panic messages.
impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Secret").field(&"<redacted>").finish()
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CipherError> {
        if data.len() != SECRET_SIZE {
            return Err(CipherError::InvalidKeySize {
                expected: SECRET_SIZE,
                got: data.len(),
            });
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt data using ChaCha20-Poly1305 AEAD
    ///
    /// The output format is: `nonce (12 bytes) || ciphertext || auth_tag (16 bytes)`.
    /// A random nonce is generated for each encryption operation.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        let key = Key::from_slice(self.bytes());
        let cipher = ChaCha20Poly1305::new(key);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| CipherError::NonceGeneration(e.to_string()))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher.encrypt(nonce, data).map_err(|_| CipherError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(out)
    }

    /// Decrypt data using ChaCha20-Poly1305 AEAD
    ///
    /// Expects input in the format: `nonce (12 bytes) || ciphertext || auth_tag (16 bytes)`.
    /// Fails closed: a truncated input or a failed authentication tag returns
    /// [`CipherError::Integrity`], never partially-decrypted bytes.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        if data.len() < NONCE_SIZE {
            return Err(CipherError::Integrity);
        }

        let key = Key::from_slice(self.bytes());
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let cipher = ChaCha20Poly1305::new(key);
        cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| CipherError::Integrity)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secret_encrypt_decrypt() {
        let secret = Secret::generate();
        let data = b"hello world, this is a test message for encryption";

        let encrypted = secret.encrypt(data).unwrap();
        let decrypted = secret.decrypt(&encrypted).unwrap();

        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_secret_size_validation() {
        let too_short = [1u8; 16];
        let too_long = [1u8; 64];

        assert!(Secret::from_slice(&too_short).is_err());
        assert!(Secret::from_slice(&too_long).is_err());

        let just_right = [1u8; SECRET_SIZE];
        assert!(Secret::from_slice(&just_right).is_ok());
    }

    #[test]
    fn test_short_ciphertext_fails_closed() {
        let secret = Secret::generate();

        for len in 0..NONCE_SIZE {
            let short = vec![0u8; len];
            let result = secret.decrypt(&short);
            assert!(matches!(result, Err(CipherError::Integrity)));
        }
    }

    #[test]
    fn test_bit_flip_fails_authentication() {
        let secret = Secret::generate();
        let data = b"test data for integrity check";

        let encrypted = secret.encrypt(data).unwrap();

        // Flipping any single bit anywhere in the blob must break decryption:
        // the nonce region changes the derived keystream, the ciphertext and
        // tag regions fail the Poly1305 check.
        for byte_idx in 0..encrypted.len() {
            for bit in 0..8 {
                let mut tampered = encrypted.clone();
                tampered[byte_idx] ^= 1 << bit;
                assert!(
                    matches!(secret.decrypt(&tampered), Err(CipherError::Integrity)),
                    "bit {} of byte {} did not break authentication",
                    bit,
                    byte_idx
                );
            }
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let secret = Secret::generate();
        let other = Secret::generate();
        let encrypted = secret.encrypt(b"some bytes").unwrap();

        assert!(matches!(other.decrypt(&encrypted), Err(CipherError::Integrity)));
    }

    #[test]
    fn test_empty_data_encryption() {
        let secret = Secret::generate();
        let data = b"";

        let encrypted = secret.encrypt(data).unwrap();
        let decrypted = secret.decrypt(&encrypted).unwrap();

        assert_eq!(decrypted, data.to_vec());
    }

    #[test]
    fn test_nonce_uniqueness() {
        let secret = Secret::generate();
        let a = secret.encrypt(b"same plaintext").unwrap();
        let b = secret.encrypt(b"same plaintext").unwrap();

        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
        assert_ne!(a, b);
    }
}
