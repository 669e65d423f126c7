//! Transfer plans: which strategy moves which bytes where.

use std::fmt;

use datacopy_core::types::S3Uri;
use serde::{Deserialize, Serialize};

/// How a single object is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStrategy {
    /// Copy within the object store, then delete the original. No bytes
    /// pass through this process.
    ServerSideMove,
    /// Stream a presigned download straight into a presigned upload.
    StreamedPipeCopy,
    /// Stream a download into an S3 multipart upload sized from the
    /// expected object size.
    SizeAwareStream,
}

impl TransferStrategy {
    /// Return the strategy as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerSideMove => "SERVER_SIDE_MOVE",
            Self::StreamedPipeCopy => "STREAMED_PIPE_COPY",
            Self::SizeAwareStream => "SIZE_AWARE_STREAM",
        }
    }
}

impl fmt::Display for TransferStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A time-limited URL granting GET or PUT access to one object.
///
/// Never logged: `Debug` and `Display` print only the host.
#[derive(Clone, PartialEq, Eq)]
pub struct PresignedUrl(String);

impl PresignedUrl {
    /// Wrap a presigned URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The full URL, for handing to the HTTP client only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn host(&self) -> &str {
        let rest = self.0.split_once("://").map_or(self.0.as_str(), |(_, r)| r);
        rest.split(['/', '?']).next().unwrap_or_default()
    }
}

impl fmt::Debug for PresignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PresignedUrl({}/<redacted>)", self.host())
    }
}

impl fmt::Display for PresignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/<redacted>", self.host())
    }
}

/// Endpoint of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferLocator {
    /// Reachable through a presigned URL.
    Presigned(PresignedUrl),
    /// Reachable through the S3 API with scoped credentials.
    S3(S3Uri),
}

impl fmt::Display for TransferLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presigned(url) => write!(f, "{url}"),
            Self::S3(uri) => write!(f, "{uri}"),
        }
    }
}

/// A fully resolved single-object transfer. Derived per invocation and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Strategy to execute.
    pub strategy: TransferStrategy,
    /// Where the bytes come from.
    pub source: TransferLocator,
    /// Where the bytes go.
    pub destination: TransferLocator,
    /// Size of the source object when known.
    pub expected_size_bytes: Option<u64>,
}
