use std::sync::Arc;
use std::time::Duration;

use url::Url;

use blob_store::{BlobStore, BlobStoreConfig, BlobStoreError};
use common::crypto::{Keyring, KeyringError, Secret};

use super::auth::Authenticator;
use super::cache::Cache;
use super::config::Config;
use super::database::{Database, DatabaseSetupError};
use super::ratelimit::RateLimiter;

/// Main service state - one explicitly constructed handle per component,
/// shared by reference across request tasks.
#[derive(Clone)]
pub struct State {
    database: Database,
    blobs: BlobStore,
    cache: Cache,
    keyring: Arc<Keyring>,
    limiter: RateLimiter,
    authenticator: Authenticator,
    public_url: Url,
    metadata_ttl: Duration,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => Url::parse(&format!("sqlite://{}", path.display()))
                .map_err(|_| StateSetupError::InvalidDatabaseUrl),
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup blob store
        let blobs = match config.uploads_path {
            Some(ref path) => {
                BlobStore::new(BlobStoreConfig::Local { path: path.clone() }).await?
            }
            None => {
                tracing::warn!("no uploads path configured, blobs will not survive restarts");
                BlobStore::memory()
            }
        };

        // 3. Setup keyring
        let keyring = match config.master_key_hex {
            Some(ref hex_key) => Keyring::from_hex(config.master_key_id.as_str(), hex_key)?,
            None => {
                tracing::warn!(
                    "no master key configured, generating an ephemeral one; \
                     previously stored blobs will not decrypt"
                );
                Keyring::from_secret(config.master_key_id.as_str(), Secret::generate())
            }
        };

        // 4. Setup cache-backed admission
        let cache = Cache::new();
        let limiter = RateLimiter::new(
            cache.clone(),
            config.rate_limit_ceiling,
            config.rate_limit_window,
        );

        // 5. Setup token verification
        let authenticator = match config.token_secret {
            Some(ref secret) => Authenticator::new(secret.as_bytes()),
            None => {
                tracing::warn!("no token secret configured, tokens will not survive restarts");
                Authenticator::new(Secret::generate().bytes())
            }
        };

        Ok(Self {
            database,
            blobs,
            cache,
            keyring: Arc::new(keyring),
            limiter,
            authenticator,
            public_url: config.public_url.clone(),
            metadata_ttl: config.metadata_ttl,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn metadata_ttl(&self) -> Duration {
        self.metadata_ttl
    }

    /// The capability URL for a file id: whoever holds it can fetch the
    /// plaintext without authenticating.
    pub fn access_url(&self, file_id: i64) -> String {
        format!(
            "{}/files/access/{}",
            self.public_url.as_str().trim_end_matches('/'),
            file_id
        )
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        &self.database
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("Blob store error: {0}")]
    BlobStoreError(#[from] BlobStoreError),
    #[error("Keyring error: {0}")]
    KeyringError(#[from] KeyringError),
}
