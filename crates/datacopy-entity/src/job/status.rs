//! Copy job status and its coarse summary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fine-grained status of a batch copy job, as reported by the storage service.
///
/// Only the remote service mutates this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CopyJobStatus {
    /// Accepted but not yet scheduled.
    Initialized,
    /// Scheduled, waiting for capacity.
    WaitingForResources,
    /// Copying.
    Running,
    /// Stopped before completion.
    Stopped,
    /// Every object copied.
    Succeeded,
    /// Some objects copied.
    PartiallySucceeded,
    /// Nothing useful copied.
    Failed,
}

impl CopyJobStatus {
    /// Collapse the provider status into the three buckets the caller branches on.
    pub fn summarize(self) -> JobSummary {
        match self {
            Self::Initialized => JobSummary::Running,
            Self::WaitingForResources => JobSummary::Running,
            Self::Running => JobSummary::Running,
            Self::Stopped => JobSummary::Failed,
            Self::PartiallySucceeded => JobSummary::Failed,
            Self::Failed => JobSummary::Failed,
            Self::Succeeded => JobSummary::Succeeded,
        }
    }

    /// Return the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "INITIALIZED",
            Self::WaitingForResources => "WAITING_FOR_RESOURCES",
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Succeeded => "SUCCEEDED",
            Self::PartiallySucceeded => "PARTIALLY_SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    /// Every status, in provider order.
    pub const ALL: [CopyJobStatus; 7] = [
        Self::Initialized,
        Self::WaitingForResources,
        Self::Running,
        Self::Stopped,
        Self::Succeeded,
        Self::PartiallySucceeded,
        Self::Failed,
    ];
}

impl fmt::Display for CopyJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse job status handed back to the external caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobSummary {
    /// Still in progress; poll again later.
    Running,
    /// Ended without copying everything; eligible for resubmission.
    Failed,
    /// Done.
    Succeeded,
}

impl JobSummary {
    /// Whether no further polling is needed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "RUNNING",
            Self::Failed => "FAILED",
            Self::Succeeded => "SUCCEEDED",
        };
        write!(f, "{s}")
    }
}
