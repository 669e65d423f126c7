//! Shared handles from which every service is built.

use std::sync::Arc;
use std::time::Duration;

use datacopy_core::config::AppConfig;
use datacopy_storage::s3::ExternalObjects;
use datacopy_storage::{DataStore, TransferExecutors};

use crate::classify::PartStructureClassifier;
use crate::copy::{CopyJobLifecycle, CopySetDecomposer, PartialStateReconciler};
use crate::rename::{RenameMapper, RenameService};
use crate::resolver::DataResolver;
use crate::transfer::{ExternalTransferService, TransferService};

/// Storage seams plus configuration. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Remote storage service.
    pub store: Arc<dyn DataStore>,
    /// External S3 buckets.
    pub external: Arc<dyn ExternalObjects>,
    /// Registered transfer executors.
    pub executors: Arc<TransferExecutors>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
}

impl ServiceContext {
    /// Creates a new context.
    pub fn new(
        store: Arc<dyn DataStore>,
        external: Arc<dyn ExternalObjects>,
        executors: Arc<TransferExecutors>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            external,
            executors,
            config,
        }
    }

    pub fn resolver(&self) -> DataResolver {
        DataResolver::new(Arc::clone(&self.store))
    }

    pub fn reconciler(&self) -> PartialStateReconciler {
        PartialStateReconciler::new(
            Arc::clone(&self.store),
            Duration::from_secs(self.config.transfer.settle_wait_seconds),
        )
    }

    pub fn decomposer(&self) -> CopySetDecomposer {
        CopySetDecomposer::new(Arc::clone(&self.store), self.resolver())
    }

    pub fn lifecycle(&self) -> CopyJobLifecycle {
        CopyJobLifecycle::new(
            Arc::clone(&self.store),
            self.resolver(),
            self.reconciler(),
            self.config.job.clone(),
        )
    }

    pub fn classifier(&self) -> PartStructureClassifier {
        PartStructureClassifier::new(self.resolver())
    }

    pub fn transfers(&self) -> TransferService {
        TransferService::new(
            Arc::clone(&self.store),
            self.resolver(),
            self.reconciler(),
            Arc::clone(&self.executors),
        )
    }

    pub fn external_transfers(&self) -> ExternalTransferService {
        ExternalTransferService::new(
            self.transfers(),
            Arc::clone(&self.external),
            Duration::from_secs(self.config.transfer.presign_expiry_seconds),
        )
    }

    pub fn renamer(&self) -> RenameService {
        RenameService::new(
            Arc::clone(&self.store),
            self.resolver(),
            self.transfers(),
            Arc::clone(&self.executors),
        )
    }

    pub fn rename_mapper(&self) -> RenameMapper {
        RenameMapper::new(self.resolver())
    }
}
