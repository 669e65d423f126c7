//! Single-object transfer configuration.

use serde::{Deserialize, Serialize};

/// Settings for the single-object transfer strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Seconds to wait after deleting a PARTIAL object before trusting a
    /// subsequent existence check.
    #[serde(default = "default_settle_wait")]
    pub settle_wait_seconds: u64,
    /// Objects larger than this are moved server-side with a multipart copy
    /// (default 5 GiB, the single-request copy limit).
    #[serde(default = "default_multipart_copy_threshold")]
    pub multipart_copy_threshold_bytes: u64,
    /// Smallest part size used for multipart uploads and copies (default 8 MiB).
    #[serde(default = "default_min_part_size")]
    pub min_part_size_bytes: u64,
    /// Maximum number of parts in one multipart upload.
    #[serde(default = "default_max_parts")]
    pub max_parts: u64,
    /// Validity window for presigned GET URLs on external sources.
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_seconds: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            settle_wait_seconds: default_settle_wait(),
            multipart_copy_threshold_bytes: default_multipart_copy_threshold(),
            min_part_size_bytes: default_min_part_size(),
            max_parts: default_max_parts(),
            presign_expiry_seconds: default_presign_expiry(),
        }
    }
}

fn default_settle_wait() -> u64 {
    5
}

fn default_multipart_copy_threshold() -> u64 {
    5_368_709_120 // 5 GiB
}

fn default_min_part_size() -> u64 {
    8_388_608 // 8 MiB
}

fn default_max_parts() -> u64 {
    10_000
}

fn default_presign_expiry() -> u64 {
    3600
}
