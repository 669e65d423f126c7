//! Transfer outcomes returned to the caller and execution reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::TransferStrategy;

/// What a single-object transfer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TransferOutcome {
    /// The destination already held an object of the same size. Nothing moved.
    Skip,
    /// The object was transferred.
    Success,
}

/// Execution record of one transfer strategy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReport {
    /// Strategy that ran.
    pub strategy: TransferStrategy,
    /// Bytes that passed through this process (zero for server-side moves).
    pub bytes_streamed: u64,
    /// Number of multipart parts written, when applicable.
    pub parts: u32,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
}

impl TransferReport {
    /// Wall-clock duration of the run in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
