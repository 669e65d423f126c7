//! Batch copy job lifecycle: submit, poll, and bounded retry.
//!
//! The lifecycle never sleeps or loops. Each call performs one step and
//! returns a [`CopyJobState`] the caller persists and feeds back in after
//! waiting `waitTimeSeconds`.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, warn};

use datacopy_core::config::JobConfig;
use datacopy_core::error::AppError;
use datacopy_core::types::JobId;
use datacopy_entity::data::{DataDescriptor, DataRef};
use datacopy_entity::job::{CopyBatchRequest, CopyJobState, CopyJobStatus, JobSummary};
use datacopy_storage::DataStore;

use super::reconciler::PartialStateReconciler;
use crate::resolver::DataResolver;

/// Collapse a provider job status into RUNNING, FAILED, or SUCCEEDED.
pub fn summarize(status: CopyJobStatus) -> JobSummary {
    status.summarize()
}

/// Drives one batch copy job to completion across caller invocations.
#[derive(Debug, Clone)]
pub struct CopyJobLifecycle {
    /// Remote storage service.
    store: Arc<dyn DataStore>,
    /// Locator resolver.
    resolver: DataResolver,
    /// Partial-state reconciler run before every submission.
    reconciler: PartialStateReconciler,
    /// Retry policy.
    policy: JobConfig,
}

impl CopyJobLifecycle {
    /// Creates a new lifecycle driver.
    pub fn new(
        store: Arc<dyn DataStore>,
        resolver: DataResolver,
        reconciler: PartialStateReconciler,
        policy: JobConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            reconciler,
            policy,
        }
    }

    /// Reconcile the destination against the source names, then submit a
    /// batch copy. Returns the new job id.
    pub async fn submit(
        &self,
        destination: &DataRef,
        sources: &[DataRef],
    ) -> Result<JobId, AppError> {
        let folder = self.resolver.resolve_folder_ref(destination).await?;
        let descriptors: Vec<DataDescriptor> =
            try_join_all(sources.iter().map(|s| self.resolver.resolve_ref(s))).await?;

        let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
        self.reconciler
            .reconcile_before_transfer(&folder, &names)
            .await?;

        let request = CopyBatchRequest {
            source_data_ids: descriptors.iter().map(|d| d.data_id.clone()).collect(),
            destination_project_id: folder.project_id.clone(),
            destination_folder_path: folder.path.clone(),
        };
        let job_id = self.store.submit_copy_batch(&request).await?;

        info!(
            job_id = %job_id,
            destination = %folder.path,
            sources = request.source_data_ids.len(),
            "Submitted batch copy job"
        );
        Ok(job_id)
    }

    /// Submit and return the initial caller state.
    pub async fn launch(
        &self,
        destination: &DataRef,
        sources: &[DataRef],
    ) -> Result<CopyJobState, AppError> {
        let job_id = self.submit(destination, sources).await?;
        Ok(CopyJobState::submitted(
            job_id,
            self.policy.default_wait_seconds.min(self.policy.max_wait_seconds),
        ))
    }

    /// Read the current provider status of a job once.
    pub async fn poll(&self, job_id: &JobId) -> Result<CopyJobStatus, AppError> {
        Ok(self.store.job_status(job_id).await?.status)
    }

    /// One retry-policy step: poll the tracked job and act on its summary.
    ///
    /// A state that is already SUCCEEDED is returned unchanged without polling.
    pub async fn advance(
        &self,
        state: CopyJobState,
        destination: &DataRef,
        sources: &[DataRef],
    ) -> Result<CopyJobState, AppError> {
        if state.status == JobSummary::Succeeded {
            return Ok(state);
        }
        let status = self.poll(&state.job_id).await?;
        info!(job_id = %state.job_id, %status, "Polled batch copy job");
        self.apply(state, summarize(status), destination, sources)
            .await
    }

    /// Apply an already-known summary to `state`.
    pub async fn apply(
        &self,
        mut state: CopyJobState,
        summary: JobSummary,
        destination: &DataRef,
        sources: &[DataRef],
    ) -> Result<CopyJobState, AppError> {
        match summary {
            JobSummary::Succeeded => {
                state.status = JobSummary::Succeeded;
                Ok(state)
            }
            JobSummary::Running => {
                state.status = JobSummary::Running;
                state.wait_time_seconds = self.next_wait(state.wait_time_seconds);
                Ok(state)
            }
            JobSummary::Failed => {
                if state.attempt_count >= self.policy.max_attempts {
                    let mut failed = state.failed_job_list.clone();
                    failed.push(state.job_id.clone());
                    let failed: Vec<&str> = failed.iter().map(JobId::as_str).collect();
                    return Err(AppError::job_retries_exhausted(format!(
                        "Copy job failed {} times; failed jobs: {}",
                        state.attempt_count,
                        failed.join(", ")
                    )));
                }

                warn!(
                    job_id = %state.job_id,
                    attempt = state.attempt_count,
                    max_attempts = self.policy.max_attempts,
                    "Batch copy job failed, resubmitting"
                );
                let job_id = self.submit(destination, sources).await?;
                state.failed_job_list.push(std::mem::replace(&mut state.job_id, job_id));
                state.attempt_count += 1;
                state.status = JobSummary::Running;
                state.wait_time_seconds = self.next_wait(state.wait_time_seconds);
                Ok(state)
            }
        }
    }

    /// Wait interval for the next poll, capped at the configured maximum.
    pub fn next_wait(&self, current: u64) -> u64 {
        current
            .saturating_add(self.policy.wait_increment_seconds)
            .min(self.policy.max_wait_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datacopy_core::ErrorKind;
    use datacopy_storage::providers::MemoryDataStore;
    use std::time::Duration;

    struct Fixture {
        store: Arc<MemoryDataStore>,
        lifecycle: CopyJobLifecycle,
        destination: DataRef,
        sources: Vec<DataRef>,
    }

    fn fixture(max_attempts: u32) -> Fixture {
        let store = Arc::new(MemoryDataStore::new());
        let destination = store.add_folder("dst", "/out/").data_ref();
        let sources = vec![
            store.add_file("src", "/in/a.txt", 1, None).data_ref(),
            store.add_file("src", "/in/b.txt", 2, None).data_ref(),
        ];
        let resolver = DataResolver::new(store.clone());
        let reconciler = PartialStateReconciler::new(store.clone(), Duration::from_secs(5));
        let policy = JobConfig {
            max_attempts,
            default_wait_seconds: 10,
            wait_increment_seconds: 10,
            max_wait_seconds: 40,
        };
        let lifecycle = CopyJobLifecycle::new(store.clone(), resolver, reconciler, policy);
        Fixture {
            store,
            lifecycle,
            destination,
            sources,
        }
    }

    #[test]
    fn test_summarize_buckets() {
        assert_eq!(summarize(CopyJobStatus::WaitingForResources), JobSummary::Running);
        assert_eq!(summarize(CopyJobStatus::Stopped), JobSummary::Failed);
        assert_eq!(summarize(CopyJobStatus::PartiallySucceeded), JobSummary::Failed);
        assert_eq!(summarize(CopyJobStatus::Succeeded), JobSummary::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_reconciles_partial_destination_first() {
        let f = fixture(3);
        let partial = f.store.add_partial_file("dst", "/out/a.txt");

        let job_id = f.lifecycle.submit(&f.destination, &f.sources).await.unwrap();

        assert_eq!(job_id.as_str(), "job-1");
        assert_eq!(f.store.deleted(), vec![partial.data_id]);
        let submission = &f.store.submissions()[0];
        assert_eq!(submission.destination_folder_path, "/out/");
        assert_eq!(submission.source_data_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_running_grows_wait_up_to_cap() {
        let f = fixture(3);
        let mut state = f.lifecycle.launch(&f.destination, &f.sources).await.unwrap();
        assert_eq!(state.wait_time_seconds, 10);

        for expected in [20, 30, 40, 40] {
            state = f
                .lifecycle
                .advance(state, &f.destination, &f.sources)
                .await
                .unwrap();
            assert_eq!(state.status, JobSummary::Running);
            assert_eq!(state.wait_time_seconds, expected);
        }
        assert_eq!(f.store.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_succeeded_is_terminal() {
        let f = fixture(3);
        let state = f.lifecycle.launch(&f.destination, &f.sources).await.unwrap();
        f.store.set_job_status(&state.job_id, CopyJobStatus::Succeeded);

        let done = f
            .lifecycle
            .advance(state, &f.destination, &f.sources)
            .await
            .unwrap();
        assert_eq!(done.status, JobSummary::Succeeded);
        assert_eq!(done.wait_time_seconds, 10);

        let again = f
            .lifecycle
            .advance(done.clone(), &f.destination, &f.sources)
            .await
            .unwrap();
        assert_eq!(again, done);
    }

    #[tokio::test]
    async fn test_failed_job_is_resubmitted_with_new_id() {
        let f = fixture(3);
        let state = f.lifecycle.launch(&f.destination, &f.sources).await.unwrap();
        f.store.set_job_status(&state.job_id, CopyJobStatus::PartiallySucceeded);

        let next = f
            .lifecycle
            .advance(state, &f.destination, &f.sources)
            .await
            .unwrap();
        assert_eq!(next.job_id.as_str(), "job-2");
        assert_eq!(next.attempt_count, 2);
        assert_eq!(next.failed_job_list, vec![JobId::new("job-1")]);
        assert_eq!(next.status, JobSummary::Running);
        assert_eq!(next.wait_time_seconds, 20);
    }

    #[tokio::test]
    async fn test_retries_exhausted_after_max_attempts() {
        let f = fixture(3);
        let mut state = f.lifecycle.launch(&f.destination, &f.sources).await.unwrap();

        let err = loop {
            f.store.set_job_status(&state.job_id, CopyJobStatus::Failed);
            match f.lifecycle.advance(state, &f.destination, &f.sources).await {
                Ok(next) => state = next,
                Err(e) => break e,
            }
        };

        assert_eq!(err.kind, ErrorKind::JobRetriesExhausted);
        assert!(err.message.contains("job-3"));
        assert_eq!(f.store.submissions().len(), 3);
    }
}
