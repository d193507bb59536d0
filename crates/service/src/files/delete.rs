//! Owner-checked file destruction.

use crate::state::State;

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("file not found")]
    NotFound,
    #[error("metadata delete failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Destroy a file the caller owns: blob first, then the metadata row.
///
/// This path never consults the cache - existence and ownership are
/// re-validated against the metadata store, the one consistency-critical
/// read of a mutating operation. A failed blob delete is logged and the
/// row removed anyway; the orphaned blob is a reconciliation concern, not
/// a reason to keep serving the record.
pub async fn delete_file(state: &State, owner_id: i64, file_id: i64) -> Result<(), DeleteError> {
    let record = state
        .database()
        .file_owned(file_id, owner_id)
        .await?
        .ok_or(DeleteError::NotFound)?;

    if let Err(e) = state.blobs().delete(&record.storage_locator).await {
        tracing::warn!(
            locator = %record.storage_locator,
            "blob delete failed, leaving for reconciliation: {}",
            e
        );
    }

    if !state.database().delete_file(file_id, owner_id).await? {
        // the row vanished between the ownership check and the delete;
        // a concurrent destroyer already won
        return Err(DeleteError::NotFound);
    }

    tracing::info!(file_id, owner_id, "deleted file");
    Ok(())
}
