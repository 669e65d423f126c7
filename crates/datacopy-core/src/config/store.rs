//! Remote storage service configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the project-scoped remote storage service.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// URI scheme used for locators, e.g. `icav2://{projectId}/path`.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Base URL of the service REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token for the service API.
    #[serde(default)]
    pub access_token: String,
    /// Page size used when listing folder contents.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Per-request timeout in seconds for API calls (not transfers).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            base_url: default_base_url(),
            access_token: String::new(),
            page_size: default_page_size(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("scheme", &self.scheme)
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

fn default_scheme() -> String {
    "icav2".to_string()
}

fn default_base_url() -> String {
    "https://ica.illumina.com/ica/rest".to_string()
}

fn default_page_size() -> u32 {
    1000
}

fn default_request_timeout() -> u64 {
    60
}
