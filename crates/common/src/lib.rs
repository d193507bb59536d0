/**
 * Cryptographic types and operations.
 *  - Symmetric content encryption (ChaCha20-Poly1305)
 *  - Keyring with tagged keys for rotation-safe decryption
 */
pub mod crypto;

pub mod prelude {
    pub use crate::crypto::{CipherError, KeyId, Keyring, KeyringError, Secret};
}
