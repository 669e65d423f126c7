//! Batch copy job retry policy configuration.

use serde::{Deserialize, Serialize};

/// Retry and backoff settings for asynchronous batch copy jobs.
///
/// The wait values are handed back to the external caller, which uses them
/// to schedule the next poll. Nothing in-process sleeps on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Maximum number of submissions of a copy job before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait interval handed out with a freshly submitted job.
    #[serde(default = "default_wait")]
    pub default_wait_seconds: u64,
    /// Amount the wait interval grows by on each non-terminal cycle.
    #[serde(default = "default_wait_increment")]
    pub wait_increment_seconds: u64,
    /// Upper bound on the wait interval.
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            default_wait_seconds: default_wait(),
            wait_increment_seconds: default_wait_increment(),
            max_wait_seconds: default_max_wait(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_wait() -> u64 {
    10
}

fn default_wait_increment() -> u64 {
    10
}

fn default_max_wait() -> u64 {
    600
}
