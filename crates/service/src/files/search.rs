//! Predicate-filtered listing of one user's files, cache-accelerated.

use crate::database::{FileFilter, FileRecord};
use crate::state::State;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("no files found")]
    NotFound,
    #[error("metadata read failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// List the caller's files matching the filter.
///
/// Cache-aside keyed on the full predicate tuple including the identity.
/// An empty result is `NotFound` rather than an empty list, and is never
/// cached - the next request re-checks the source of truth.
pub async fn search_files(
    state: &State,
    owner_id: i64,
    filter: &FileFilter,
) -> Result<Vec<FileRecord>, SearchError> {
    let cache_key = filter.cache_key(owner_id);

    if let Some(raw) = state.cache().get(&cache_key) {
        if let Ok(records) = serde_json::from_str::<Vec<FileRecord>>(&raw) {
            return Ok(records);
        }
    }

    let records = state.database().search_files(owner_id, filter).await?;
    if records.is_empty() {
        return Err(SearchError::NotFound);
    }

    if let Ok(raw) = serde_json::to_string(&records) {
        state.cache().put(cache_key, raw, state.metadata_ttl());
    }

    Ok(records)
}
