//! Recording executor for tests.
//!
//! Records every plan it is handed and, when attached to a
//! [`MemoryDataStore`], applies the transfer's effect to the store so that
//! later lookups see the uploaded or moved object.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use datacopy_core::types::ScopedCredentials;
use datacopy_entity::transfer::{TransferLocator, TransferPlan, TransferReport, TransferStrategy};

use super::{TransferError, TransferExecutor};
use crate::providers::MemoryDataStore;

/// A plan as seen by the [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    /// Strategy requested.
    pub strategy: TransferStrategy,
    /// The plan itself.
    pub plan: TransferPlan,
    /// Whether scoped credentials were passed.
    pub had_credentials: bool,
    /// Folder prefix the passed credentials are scoped to.
    pub credentials_prefix: Option<String>,
}

#[derive(Debug, Default)]
struct Recorder {
    transfers: Vec<RecordedTransfer>,
    fail_with: Option<String>,
    retain_sources_with: Option<String>,
}

/// Executor that records plans instead of moving bytes.
#[derive(Debug, Clone)]
pub struct RecordingExecutor {
    strategy: TransferStrategy,
    store: Option<Arc<MemoryDataStore>>,
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingExecutor {
    /// Recorder for `strategy` with no side effects.
    pub fn new(strategy: TransferStrategy) -> Self {
        Self {
            strategy,
            store: None,
            recorder: Arc::new(Mutex::new(Recorder::default())),
        }
    }

    /// Apply each successful transfer to `store`.
    pub fn with_store(mut self, store: Arc<MemoryDataStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn recorder(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every later execution fail with an upload error carrying `diagnostics`.
    pub fn fail_with(&self, diagnostics: impl Into<String>) {
        self.recorder().fail_with = Some(diagnostics.into());
    }

    /// Make later S3-to-S3 transfers copy the object but keep the source,
    /// failing with `detail` the way a refused delete does.
    pub fn retain_sources_with(&self, detail: impl Into<String>) {
        self.recorder().retain_sources_with = Some(detail.into());
    }

    /// Every plan executed so far.
    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        self.recorder().transfers.clone()
    }

    /// Number of plans executed so far.
    pub fn count(&self) -> usize {
        self.recorder().transfers.len()
    }

    fn apply(&self, plan: &TransferPlan, size: u64) -> u32 {
        let Some(store) = &self.store else {
            return 1;
        };
        match (&plan.source, &plan.destination) {
            (TransferLocator::S3(src), TransferLocator::S3(dst)) => {
                store.move_object(src, dst);
                1
            }
            (_, TransferLocator::Presigned(url)) => {
                store.complete_upload(url, size);
                1
            }
            (_, TransferLocator::S3(dst)) => {
                let parts = u32::try_from(size.div_ceil(8 * 1024 * 1024).max(1)).unwrap_or(1);
                store.put_object(dst, size, parts);
                parts
            }
        }
    }
}

#[async_trait]
impl TransferExecutor for RecordingExecutor {
    fn strategy(&self) -> TransferStrategy {
        self.strategy
    }

    async fn execute(
        &self,
        plan: &TransferPlan,
        credentials: Option<&ScopedCredentials>,
    ) -> Result<TransferReport, TransferError> {
        let started_at = Utc::now();
        let (failure, retain) = {
            let mut recorder = self.recorder();
            recorder.transfers.push(RecordedTransfer {
                strategy: plan.strategy,
                plan: plan.clone(),
                had_credentials: credentials.is_some(),
                credentials_prefix: credentials.map(|c| c.object_prefix.clone()),
            });
            (recorder.fail_with.clone(), recorder.retain_sources_with.clone())
        };
        if let Some(body) = failure {
            return Err(TransferError::Http {
                stage: "upload",
                status: 500,
                body,
            });
        }

        if let (Some(detail), TransferLocator::S3(src), TransferLocator::S3(dst)) =
            (retain, &plan.source, &plan.destination)
        {
            if let Some(store) = &self.store {
                store.copy_object(src, dst);
            }
            return Err(TransferError::SourceRetained {
                original: src.clone(),
                detail,
            });
        }

        let size = plan.expected_size_bytes.unwrap_or(0);
        let parts = self.apply(plan, size);
        let bytes_streamed = match plan.strategy {
            TransferStrategy::ServerSideMove => 0,
            TransferStrategy::StreamedPipeCopy | TransferStrategy::SizeAwareStream => size,
        };

        Ok(TransferReport {
            strategy: self.strategy,
            bytes_streamed,
            parts,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
