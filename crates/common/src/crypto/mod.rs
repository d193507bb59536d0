//! Cryptographic primitives for VaultDrop
//!
//! This module provides the encryption layer for files at rest:
//!
//! - **Content Encryption**: ChaCha20-Poly1305 AEAD over whole-file buffers.
//!   Every sealed blob is self-describing: a fresh random nonce is prepended
//!   to the authenticated ciphertext, so decryption needs no external nonce
//!   storage.
//! - **Keyring**: named symmetric keys with a single active id. Blobs record
//!   the id of the key that sealed them, so a future key rotation can add a
//!   new active key without breaking reads of older blobs.
//!
//! Rotating a key *out* of the keyring invalidates every blob sealed under
//! it. That is a documented limitation, not something this layer solves.

mod keyring;
mod secret;

pub use keyring::{KeyId, Keyring, KeyringError};
pub use secret::{CipherError, Secret, NONCE_SIZE, SECRET_SIZE};
