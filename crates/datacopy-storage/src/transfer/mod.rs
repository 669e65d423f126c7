//! Transfer executors: one implementation per transfer strategy.

pub mod multipart;
pub mod pipe;
#[cfg(any(test, feature = "testing"))]
pub mod recording;
pub mod server_side;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use datacopy_core::error::AppError;
use datacopy_core::types::{S3Uri, ScopedCredentials};
use datacopy_entity::transfer::{TransferPlan, TransferReport, TransferStrategy};

pub use multipart::SizeAwareStream;
pub use pipe::StreamedPipeCopy;
#[cfg(any(test, feature = "testing"))]
pub use recording::{RecordedTransfer, RecordingExecutor};
pub use server_side::ServerSideMove;

/// Capability to run one transfer strategy.
#[async_trait]
pub trait TransferExecutor: Send + Sync + std::fmt::Debug {
    /// The strategy this executor implements.
    fn strategy(&self) -> TransferStrategy;

    /// Move the bytes described by `plan`.
    ///
    /// `credentials` are required by the strategies that talk to S3 directly.
    async fn execute(
        &self,
        plan: &TransferPlan,
        credentials: Option<&ScopedCredentials>,
    ) -> Result<TransferReport, TransferError>;
}

/// Failure of a transfer, carrying the diagnostics captured along the way.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The plan's locators do not fit the executor.
    #[error("{strategy} cannot transfer {detail}")]
    UnsupportedPlan {
        /// Executor strategy.
        strategy: TransferStrategy,
        /// What was wrong with the plan.
        detail: String,
    },

    /// The strategy needs scoped credentials and none were passed.
    #[error("{0} requires scoped credentials")]
    MissingCredentials(TransferStrategy),

    /// The executor needs the object size and the plan has none.
    #[error("{0} requires the expected object size")]
    MissingSize(TransferStrategy),

    /// An HTTP leg returned a non-success status.
    #[error("{stage} failed with status {status}: {body}")]
    Http {
        /// `download` or `upload`.
        stage: &'static str,
        /// Response status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// An HTTP leg failed before a response arrived.
    #[error("{stage} request error: {detail}")]
    Request {
        /// `download` or `upload`.
        stage: &'static str,
        /// Client error text.
        detail: String,
    },

    /// An S3 API call failed.
    #[error("S3 {operation} failed: {detail}")]
    S3 {
        /// API operation name.
        operation: &'static str,
        /// Error text reported by the SDK.
        detail: String,
    },

    /// Fewer or more bytes arrived than expected.
    #[error("expected {expected} bytes, transferred {actual}")]
    SizeMismatch {
        /// Expected size.
        expected: u64,
        /// Bytes actually transferred.
        actual: u64,
    },

    /// The object reached its destination but the original could not be
    /// deleted. Both copies exist.
    #[error("copied {original} but could not delete it: {detail}")]
    SourceRetained {
        /// Object left in place.
        original: S3Uri,
        /// Error text reported by the SDK.
        detail: String,
    },

    /// No executor is registered for the plan's strategy.
    #[error("no executor registered for {0}")]
    NoExecutor(TransferStrategy),
}

impl TransferError {
    pub(crate) fn s3(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::S3 {
            operation,
            detail: err.to_string(),
        }
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::SourceRetained { .. } => AppError::rename_incomplete(err.to_string()),
            _ => AppError::child_transfer_failure(err.to_string()),
        }
    }
}

const MAX_BODY_DIAGNOSTIC: usize = 2048;

/// Clip a response body for inclusion in diagnostics.
pub(crate) fn clip_body(mut body: String) -> String {
    if body.len() > MAX_BODY_DIAGNOSTIC {
        let mut cut = MAX_BODY_DIAGNOSTIC;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

/// Registry of executors keyed by strategy.
#[derive(Debug, Clone, Default)]
pub struct TransferExecutors {
    executors: HashMap<TransferStrategy, Arc<dyn TransferExecutor>>,
}

impl TransferExecutors {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor, replacing any previous one for the same strategy.
    pub fn register(&mut self, executor: Arc<dyn TransferExecutor>) {
        let strategy = executor.strategy();
        tracing::debug!(%strategy, "Registered transfer executor");
        self.executors.insert(strategy, executor);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, executor: Arc<dyn TransferExecutor>) -> Self {
        self.register(executor);
        self
    }

    /// Run `plan` on the executor registered for its strategy.
    pub async fn execute(
        &self,
        plan: &TransferPlan,
        credentials: Option<&ScopedCredentials>,
    ) -> Result<TransferReport, TransferError> {
        let executor = self
            .executors
            .get(&plan.strategy)
            .ok_or(TransferError::NoExecutor(plan.strategy))?;

        tracing::info!(
            strategy = %plan.strategy,
            source = %plan.source,
            destination = %plan.destination,
            expected_size_bytes = plan.expected_size_bytes,
            "Executing transfer"
        );

        let report = executor.execute(plan, credentials).await?;

        tracing::info!(
            strategy = %report.strategy,
            bytes = report.bytes_streamed,
            parts = report.parts,
            duration_ms = report.duration_ms(),
            "Transfer complete"
        );
        Ok(report)
    }
}
