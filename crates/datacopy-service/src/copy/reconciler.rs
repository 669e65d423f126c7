//! Removal of stale PARTIAL objects before a (re)submission or upload.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use datacopy_core::error::AppError;
use datacopy_entity::data::DataDescriptor;
use datacopy_storage::DataStore;

/// Clears partially written objects that would block a transfer.
#[derive(Debug, Clone)]
pub struct PartialStateReconciler {
    /// Remote storage service.
    store: Arc<dyn DataStore>,
    /// Wait after deleting before trusting existence checks again.
    settle_wait: Duration,
}

impl PartialStateReconciler {
    /// Creates a new reconciler.
    pub fn new(store: Arc<dyn DataStore>, settle_wait: Duration) -> Self {
        Self { store, settle_wait }
    }

    /// Delete immediate children of `folder` whose name is a candidate and
    /// whose status is PARTIAL. Waits the settle interval once if anything
    /// was deleted. Returns the number of deleted objects.
    pub async fn reconcile_before_transfer(
        &self,
        folder: &DataDescriptor,
        candidate_names: &[String],
    ) -> Result<usize, AppError> {
        if candidate_names.is_empty() {
            return Ok(0);
        }

        let children = self
            .store
            .list_children(&folder.project_id, &folder.data_id)
            .await?;

        let mut deleted = 0;
        for child in children
            .iter()
            .filter(|c| c.is_partial() && candidate_names.contains(&c.name))
        {
            info!(
                project_id = %child.project_id,
                path = %child.path,
                "Deleting PARTIAL object before transfer"
            );
            self.store.delete(&child.project_id, &child.data_id).await?;
            deleted += 1;
        }

        if deleted > 0 {
            self.settle().await;
        }
        Ok(deleted)
    }

    /// Wait the settle interval.
    pub async fn settle(&self) {
        tokio::time::sleep(self.settle_wait).await;
    }
}
