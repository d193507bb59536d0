//! Persist a new file: encrypt, write the blob, insert the record.

use bytes::Bytes;
use time::OffsetDateTime;

use blob_store::BlobStoreError;
use common::crypto::CipherError;

use crate::database::NewFileRecord;
use crate::state::State;

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: i64,
    pub storage_locator: String,
    /// Capability URL other clients can dereference without authenticating.
    pub public_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
    #[error("encryption failed: {0}")]
    Cipher(#[from] CipherError),
    #[error("blob write failed: {0}")]
    Blob(#[from] BlobStoreError),
    #[error("metadata write failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Store one uploaded file for the given owner.
///
/// Steps run strictly in order, each with its own failure surface:
/// validate, guess the content type from the name, build the locator,
/// encrypt under the active key, write the blob, insert the metadata row.
/// A record therefore never points at a blob that was not written first;
/// the inverse window (blob written, insert failed) is logged for the
/// reconciliation pass to clean up.
pub async fn store_file(
    state: &State,
    owner_id: i64,
    display_name: &str,
    data: Bytes,
) -> Result<StoredFile, UploadError> {
    if display_name.is_empty() {
        return Err(UploadError::InvalidUpload("missing filename".to_string()));
    }
    // The locator embeds the display name verbatim; path separators and
    // parent references must never reach the blob store.
    if display_name.contains(['/', '\\']) || display_name.contains("..") {
        return Err(UploadError::InvalidUpload("invalid filename".to_string()));
    }
    if data.is_empty() {
        return Err(UploadError::InvalidUpload("empty file".to_string()));
    }

    let content_type = mime_guess::from_path(display_name)
        .first_or_octet_stream()
        .to_string();
    let storage_locator = format!("{}_{}.enc", owner_id, display_name);

    let (key_id, secret) = state.keyring().active();
    let ciphertext = secret.encrypt(&data)?;

    state
        .blobs()
        .write(&storage_locator, Bytes::from(ciphertext))
        .await?;

    let record = NewFileRecord {
        owner_id,
        display_name: display_name.to_string(),
        content_type,
        storage_locator: storage_locator.clone(),
        key_id: key_id.to_string(),
        created_at: OffsetDateTime::now_utc(),
    };

    let id = match state.database().insert_file(&record).await {
        Ok(id) => id,
        Err(e) => {
            // The blob is now orphaned; the expiry worker's reconciliation
            // pass removes blobs with no metadata row.
            tracing::warn!(
                locator = %storage_locator,
                "orphaned blob: metadata insert failed after blob write: {}",
                e
            );
            return Err(e.into());
        }
    };

    tracing::info!(id, owner_id, locator = %storage_locator, "stored encrypted file");

    Ok(StoredFile {
        id,
        storage_locator,
        public_url: state.access_url(id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn test_state() -> State {
        State::from_config(&Config::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_store_encrypts_at_rest() {
        let state = test_state().await;
        let data = Bytes::from_static(b"plaintext contents");

        let stored = store_file(&state, 1, "a.txt", data.clone()).await.unwrap();
        assert_eq!(stored.storage_locator, "1_a.txt.enc");
        assert!(stored.public_url.ends_with(&format!("/files/access/{}", stored.id)));

        // what hit the disk is ciphertext, not the plaintext
        let on_disk = state.blobs().read(&stored.storage_locator).await.unwrap();
        assert_ne!(on_disk, data);

        // and the record tags the sealing key
        let record = state.database().file_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(record.key_id, "v1");
        assert_eq!(record.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_rejects_empty_uploads() {
        let state = test_state().await;

        let err = store_file(&state, 1, "", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidUpload(_)));

        let err = store_file(&state, 1, "a.txt", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidUpload(_)));
    }

    #[tokio::test]
    async fn test_rejects_traversal_filenames() {
        let state = test_state().await;

        for name in ["../../etc/passwd", "a/b.txt", "a\\b.txt", "..hidden"] {
            let err = store_file(&state, 1, name, Bytes::from_static(b"x"))
                .await
                .unwrap_err();
            assert!(matches!(err, UploadError::InvalidUpload(_)), "{}", name);
        }
    }
}
