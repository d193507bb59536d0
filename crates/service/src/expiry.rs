//! Retention sweep: periodically delete files older than the retention
//! window, then reconcile blobs against metadata.
//!
//! Order matters within a sweep: blobs go first, the bulk metadata delete
//! follows. A crash mid-sweep leaves at worst an orphaned metadata row a
//! future sweep can still find - never a record-less blob only the
//! reconciliation pass could spot. Per-file blob failures are logged and
//! skipped; a failed bulk delete is logged and retried on the next tick.

use std::collections::HashSet;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::watch;

use blob_store::{BlobStore, BlobStoreError};

use crate::database::Database;

#[derive(Debug, thiserror::Error)]
pub enum ExpiryError {
    #[error("metadata store error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("blob store error: {0}")]
    Blob(#[from] BlobStoreError),
}

pub struct ExpiryWorker {
    database: Database,
    blobs: BlobStore,
    retention: Duration,
    interval: Duration,
}

impl ExpiryWorker {
    pub fn new(
        database: Database,
        blobs: BlobStore,
        retention: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            database,
            blobs,
            retention,
            interval,
        }
    }

    /// Run until the shutdown signal fires. Sweep failures are logged and
    /// deferred to the next tick, never fatal to the worker.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            retention_secs = self.retention.as_secs(),
            interval_secs = self.interval.as_secs(),
            "expiry worker started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep().await {
                        Ok(removed) if removed > 0 => {
                            tracing::info!(removed, "expired files cleaned up");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!("expiry sweep failed, retrying next tick: {}", e),
                    }
                    match self.reconcile().await {
                        Ok(removed) if removed > 0 => {
                            tracing::info!(removed, "orphaned blobs reconciled");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!("blob reconciliation failed: {}", e),
                    }
                }
                _ = shutdown_rx.changed() => {
                    tracing::info!("expiry worker shutting down");
                    break;
                }
            }
        }
    }

    /// One retention pass. Returns the number of metadata rows removed.
    pub async fn sweep(&self) -> Result<u64, ExpiryError> {
        let cutoff = OffsetDateTime::now_utc() - self.retention;

        let expired = self.database.files_created_before(cutoff).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        for record in &expired {
            // best-effort: one stubborn blob must not abort the sweep
            if let Err(e) = self.blobs.delete(&record.storage_locator).await {
                tracing::warn!(
                    id = record.id,
                    locator = %record.storage_locator,
                    "failed to delete expired blob, continuing: {}",
                    e
                );
            }
        }

        let removed = self.database.delete_files_created_before(cutoff).await?;
        Ok(removed)
    }

    /// Remove blobs no metadata row references (the upload crash window).
    /// Returns the number of orphans removed.
    pub async fn reconcile(&self) -> Result<u64, ExpiryError> {
        let known: HashSet<String> = self.database.all_locators().await?.into_iter().collect();

        let mut removed = 0;
        for locator in self.blobs.list().await? {
            if known.contains(&locator) {
                continue;
            }
            match self.blobs.delete(&locator).await {
                Ok(()) => {
                    tracing::warn!(%locator, "removed orphaned blob with no metadata row");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(%locator, "failed to remove orphaned blob: {}", e);
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::files::upload::store_file;
    use crate::state::State;
    use bytes::Bytes;

    async fn test_state() -> State {
        State::from_config(&Config::default()).await.unwrap()
    }

    fn worker(state: &State, retention: Duration) -> ExpiryWorker {
        ExpiryWorker::new(
            state.database().clone(),
            state.blobs().clone(),
            retention,
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn test_zero_retention_sweeps_everything() {
        let state = test_state().await;
        let stored = store_file(&state, 1, "a.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        // give created_at a moment to fall behind the cutoff
        tokio::time::sleep(Duration::from_millis(20)).await;

        let worker = worker(&state, Duration::ZERO);
        let removed = worker.sweep().await.unwrap();
        assert_eq!(removed, 1);

        assert!(state.database().file_by_id(stored.id).await.unwrap().is_none());
        assert!(!state.blobs().exists(&stored.storage_locator).await.unwrap());

        // a second run with nothing eligible is a quiet no-op
        assert_eq!(worker.sweep().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fresh_files_survive_the_sweep() {
        let state = test_state().await;
        let stored = store_file(&state, 1, "a.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let worker = worker(&state, Duration::from_secs(3600));
        assert_eq!(worker.sweep().await.unwrap(), 0);
        assert!(state.database().file_by_id(stored.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reconcile_removes_recordless_blobs() {
        let state = test_state().await;
        let stored = store_file(&state, 1, "kept.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        // simulate the upload crash window: blob written, no row
        state
            .blobs()
            .write("9_orphan.bin.enc", Bytes::from_static(b"sealed"))
            .await
            .unwrap();

        let worker = worker(&state, Duration::from_secs(3600));
        let removed = worker.reconcile().await.unwrap();
        assert_eq!(removed, 1);

        assert!(!state.blobs().exists("9_orphan.bin.enc").await.unwrap());
        assert!(state.blobs().exists(&stored.storage_locator).await.unwrap());
    }
}
