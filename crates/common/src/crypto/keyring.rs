//! Tagged key storage for rotation-safe decryption
//!
//! Every stored blob records the id of the key that sealed it. The keyring
//! maps those ids back to key material and designates one id as active for
//! new writes. Adding a new active key is enough to rotate; old blobs keep
//! decrypting under their recorded id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::secret::{CipherError, Secret};

/// Identifier for a key in the keyring (e.g. "v1").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for KeyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KeyringError {
    #[error("invalid hex key material: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("invalid key: {0}")]
    InvalidKey(#[from] CipherError),
    #[error("no key with id '{0}' in the keyring")]
    UnknownKeyId(KeyId),
}

/// Named symmetric keys with a single active id for new writes.
#[derive(Clone)]
pub struct Keyring {
    active: KeyId,
    keys: HashMap<KeyId, Secret>,
}

impl Keyring {
    /// Build a single-key keyring from hex-encoded key material.
    ///
    /// This is how the process bootstraps from configuration: one active
    /// key, resolved at startup, never embedded in source.
    pub fn from_hex(active_id: impl Into<KeyId>, hex_key: &str) -> Result<Self, KeyringError> {
        let raw = hex::decode(hex_key.trim())?;
        let secret = Secret::from_slice(&raw)?;
        let active = active_id.into();
        let mut keys = HashMap::new();
        keys.insert(active.clone(), secret);
        Ok(Self { active, keys })
    }

    /// Build a keyring around an existing secret (used by tests).
    pub fn from_secret(active_id: impl Into<KeyId>, secret: Secret) -> Self {
        let active = active_id.into();
        let mut keys = HashMap::new();
        keys.insert(active.clone(), secret);
        Self { active, keys }
    }

    /// Add a retired key that stays readable but is never used for writes.
    pub fn insert(&mut self, id: impl Into<KeyId>, secret: Secret) {
        self.keys.insert(id.into(), secret);
    }

    /// The key new blobs are sealed with, plus its id for tagging.
    pub fn active(&self) -> (&KeyId, &Secret) {
        let secret = self
            .keys
            .get(&self.active)
            .expect("keyring invariant: active id always present");
        (&self.active, secret)
    }

    /// Resolve the key a blob was sealed with by its recorded id.
    pub fn get(&self, id: &KeyId) -> Result<&Secret, KeyringError> {
        self.keys
            .get(id)
            .ok_or_else(|| KeyringError::UnknownKeyId(id.clone()))
    }
}

impl std::fmt::Debug for Keyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyring")
            .field("active", &self.active)
            .field("keys", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_hex_roundtrip() {
        let secret = Secret::generate();
        let hex_key = hex::encode(secret.bytes());

        let keyring = Keyring::from_hex("v1", &hex_key).unwrap();
        let (id, active) = keyring.active();

        assert_eq!(id.as_str(), "v1");
        assert_eq!(active, &secret);
    }

    #[test]
    fn test_rejects_bad_material() {
        assert!(Keyring::from_hex("v1", "not hex at all").is_err());
        // valid hex, wrong length
        assert!(Keyring::from_hex("v1", "deadbeef").is_err());
    }

    #[test]
    fn test_old_key_stays_readable() {
        let old = Secret::generate();
        let new = Secret::generate();

        let sealed = old.encrypt(b"pre-rotation blob").unwrap();

        let mut keyring = Keyring::from_secret("v2", new);
        keyring.insert("v1", old);

        let key = keyring.get(&KeyId::new("v1")).unwrap();
        assert_eq!(key.decrypt(&sealed).unwrap(), b"pre-rotation blob");

        assert!(matches!(
            keyring.get(&KeyId::new("v0")),
            Err(KeyringError::UnknownKeyId(_))
        ));
    }
}
