//! Caller-persisted state of the copy job retry loop.

use datacopy_core::types::JobId;
use serde::{Deserialize, Serialize};

use super::status::JobSummary;

/// Retry-loop state echoed back and forth between the caller and each step.
///
/// Older callers send snake_case keys; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyJobState {
    /// Job currently being tracked.
    #[serde(alias = "job_id")]
    pub job_id: JobId,
    /// Number of submissions made so far, including the current one.
    #[serde(alias = "attempt_count", default = "default_attempt_count")]
    pub attempt_count: u32,
    /// Seconds the caller should wait before the next poll.
    #[serde(alias = "wait_time_seconds", default)]
    pub wait_time_seconds: u64,
    /// Coarse status after the last poll.
    #[serde(alias = "job_status")]
    pub status: JobSummary,
    /// Jobs that ended in a failed state and were resubmitted.
    #[serde(alias = "failed_job_list", default)]
    pub failed_job_list: Vec<JobId>,
}

impl CopyJobState {
    /// State for a freshly submitted job.
    pub fn submitted(job_id: JobId, wait_time_seconds: u64) -> Self {
        Self {
            job_id,
            attempt_count: 1,
            wait_time_seconds,
            status: JobSummary::Running,
            failed_job_list: Vec::new(),
        }
    }

    /// Whether the job has reached a terminal success.
    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }
}

fn default_attempt_count() -> u32 {
    1
}
