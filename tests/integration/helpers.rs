//! Shared test helpers for integration tests.

use std::sync::Arc;

use datacopy_core::config::AppConfig;
use datacopy_core::types::DataUri;
use datacopy_entity::transfer::TransferStrategy;
use datacopy_service::ServiceContext;
use datacopy_storage::TransferExecutors;
use datacopy_storage::providers::MemoryDataStore;
use datacopy_storage::s3::MemoryExternalObjects;
use datacopy_storage::transfer::RecordingExecutor;

/// Test environment: in-memory storage, recording executors, and a context
/// wired over them.
pub struct TestEnv {
    /// Storage service double.
    pub store: Arc<MemoryDataStore>,
    /// External bucket double.
    pub external: Arc<MemoryExternalObjects>,
    /// Records STREAMED_PIPE_COPY transfers.
    pub pipe: RecordingExecutor,
    /// Records SIZE_AWARE_STREAM transfers.
    pub stream: RecordingExecutor,
    /// Records SERVER_SIDE_MOVE transfers.
    pub mover: RecordingExecutor,
    /// Context under test.
    pub ctx: ServiceContext,
}

impl TestEnv {
    /// Environment with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Environment with the given configuration.
    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryDataStore::new());
        let external = Arc::new(MemoryExternalObjects::new());
        let pipe = RecordingExecutor::new(TransferStrategy::StreamedPipeCopy).with_store(store.clone());
        let stream = RecordingExecutor::new(TransferStrategy::SizeAwareStream).with_store(store.clone());
        let mover = RecordingExecutor::new(TransferStrategy::ServerSideMove).with_store(store.clone());

        let executors = TransferExecutors::new()
            .with(Arc::new(pipe.clone()))
            .with(Arc::new(stream.clone()))
            .with(Arc::new(mover.clone()));

        let ctx = ServiceContext::new(
            store.clone(),
            external.clone(),
            Arc::new(executors),
            Arc::new(config),
        );

        Self {
            store,
            external,
            pipe,
            stream,
            mover,
            ctx,
        }
    }

    /// Total number of transfers executed across all strategies.
    pub fn transfer_count(&self) -> usize {
        self.pipe.count() + self.stream.count() + self.mover.count()
    }

    /// Total bytes moved through this process.
    pub fn bytes_streamed(&self) -> u64 {
        self.pipe
            .transfers()
            .iter()
            .chain(self.stream.transfers().iter())
            .filter_map(|t| t.plan.expected_size_bytes)
            .sum()
    }
}

/// Parse a storage service URI.
pub fn uri(value: &str) -> DataUri {
    DataUri::parse(value).expect("valid test URI")
}
