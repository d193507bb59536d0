//! Blob storage backend abstraction (local filesystem/memory).

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::{BlobStoreError, Result};

/// Configuration for the blob storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlobStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage under a single root directory
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },
}

/// Wrapper around the object storage backend holding encrypted blobs.
///
/// Writes are whole-buffer, reads return the full buffer. One object per
/// upload, no directory sharding.
#[derive(Debug, Clone)]
pub struct BlobStore {
    inner: Arc<dyn ObjectStore>,
}

impl BlobStore {
    /// Create a new blob store from configuration.
    pub async fn new(config: BlobStoreConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match &config {
            BlobStoreConfig::Memory => Arc::new(InMemory::new()),

            BlobStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| BlobStoreError::InvalidConfig(e.to_string()))?,
                )
            }
        };

        Ok(Self { inner })
    }

    /// Create an in-memory blob store (tests and ephemeral setups).
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    /// Write an encrypted blob at the given locator.
    pub async fn write(&self, locator: &str, data: Bytes) -> Result<()> {
        let path = ObjectPath::from(locator);
        self.inner.put(&path, data.into()).await?;
        Ok(())
    }

    /// Read the full encrypted blob at the given locator.
    pub async fn read(&self, locator: &str) -> Result<Bytes> {
        let path = ObjectPath::from(locator);
        match self.inner.get(&path).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => {
                Err(BlobStoreError::NotFound(locator.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the blob at the given locator.
    ///
    /// A missing object is not an error - the blob may already be deleted.
    pub async fn delete(&self, locator: &str) -> Result<()> {
        let path = ObjectPath::from(locator);
        match self.inner.delete(&path).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a blob exists at the given locator.
    pub async fn exists(&self, locator: &str) -> Result<bool> {
        let path = ObjectPath::from(locator);
        match self.inner.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List every stored locator.
    ///
    /// Used by the reconciliation pass to find blobs with no metadata row.
    pub async fn list(&self) -> Result<Vec<String>> {
        let items: Vec<_> = self.inner.list(None).try_collect().await?;

        Ok(items
            .into_iter()
            .map(|meta| meta.location.as_ref().to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = BlobStore::memory();

        let locator = "1_a.txt.enc";
        let data = Bytes::from("sealed bytes");

        store.write(locator, data.clone()).await.unwrap();
        let retrieved = store.read(locator).await.unwrap();
        assert_eq!(retrieved, data);

        assert!(store.exists(locator).await.unwrap());

        let locators = store.list().await.unwrap();
        assert_eq!(locators, vec![locator.to_string()]);

        store.delete(locator).await.unwrap();
        assert!(!store.exists(locator).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let store = BlobStore::memory();

        let result = store.read("2_missing.enc").await;
        assert!(matches!(result, Err(BlobStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = BlobStore::memory();
        store.delete("3_gone.enc").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = BlobStoreConfig::Local {
            path: temp_dir.path().to_path_buf(),
        };

        let store = BlobStore::new(config).await.unwrap();

        let locator = "7_report.pdf.enc";
        let data = Bytes::from("encrypted report");

        store.write(locator, data.clone()).await.unwrap();
        let retrieved = store.read(locator).await.unwrap();
        assert_eq!(retrieved, data);

        // Verify the file landed under the root
        let file_path = temp_dir.path().join(locator);
        assert!(file_path.exists());
    }
}
