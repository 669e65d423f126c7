//! Short-lived credentials scoped to one destination folder.

use serde::{Deserialize, Serialize};

/// Temporary S3 credentials issued by the storage service for a folder.
///
/// Fetched once per invocation and passed by parameter to the transfer
/// that needs them. The `Debug` output never includes key material.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedCredentials {
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Session token.
    pub session_token: String,
    /// AWS region of the backing bucket.
    pub region: String,
    /// Bucket that backs the folder.
    pub bucket: String,
    /// Key prefix of the folder within the bucket, without trailing `/`.
    pub object_prefix: String,
}

impl ScopedCredentials {
    /// Full object key for a file named `name` inside the scoped folder.
    pub fn object_key(&self, name: &str) -> String {
        let prefix = self.object_prefix.trim_matches('/');
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        }
    }
}

impl std::fmt::Debug for ScopedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCredentials")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("object_prefix", &self.object_prefix)
            .finish()
    }
}
