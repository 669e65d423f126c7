//! Idempotent single-object transfers into a storage service folder.

use std::sync::Arc;

use tracing::{info, warn};

use datacopy_core::error::AppError;
use datacopy_core::types::S3Uri;
use datacopy_entity::data::{DataDescriptor, DataRef, PartStructure};
use datacopy_entity::transfer::{
    TransferLocator, TransferOutcome, TransferPlan, TransferReport, TransferStrategy,
};
use datacopy_storage::{DataStore, TransferExecutors};

use super::selector::{SourceOrigin, TransferIntent, select};
use crate::copy::PartialStateReconciler;
use crate::resolver::DataResolver;

/// What was found at the destination path before a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationState {
    /// Nothing usable is there; the transfer must run.
    Vacant,
    /// An object of the expected size is already there.
    Satisfied(DataDescriptor),
}

/// Runs the idempotent-upload contract and hands the byte movement to the
/// registered executors.
#[derive(Debug, Clone)]
pub struct TransferService {
    /// Remote storage service.
    store: Arc<dyn DataStore>,
    /// Locator resolver.
    resolver: DataResolver,
    /// Source of the settle wait after PARTIAL deletes.
    reconciler: PartialStateReconciler,
    /// One executor per strategy.
    executors: Arc<TransferExecutors>,
}

impl TransferService {
    /// Creates a new transfer service.
    pub fn new(
        store: Arc<dyn DataStore>,
        resolver: DataResolver,
        reconciler: PartialStateReconciler,
        executors: Arc<TransferExecutors>,
    ) -> Self {
        Self {
            store,
            resolver,
            reconciler,
            executors,
        }
    }

    /// Locator resolver used by this service.
    pub fn resolver(&self) -> &DataResolver {
        &self.resolver
    }

    /// Inspect `folder/name` and clear the way for a transfer of
    /// `expected_size` bytes.
    ///
    /// A PARTIAL object is deleted and the settle interval awaited. An
    /// existing object of the same size satisfies the transfer. Any other
    /// existing object is a [`DestinationConflict`](datacopy_core::ErrorKind::DestinationConflict).
    pub async fn prepare_destination(
        &self,
        folder: &DataDescriptor,
        name: &str,
        expected_size: u64,
    ) -> Result<DestinationState, AppError> {
        let Some(existing) = self.resolver.find_in_folder(folder, name).await? else {
            return Ok(DestinationState::Vacant);
        };

        if existing.is_partial() {
            info!(
                project_id = %existing.project_id,
                path = %existing.path,
                "Deleting PARTIAL destination before upload"
            );
            self.store
                .delete(&existing.project_id, &existing.data_id)
                .await?;
            self.reconciler.settle().await;
            return Ok(DestinationState::Vacant);
        }

        if existing.file_size_in_bytes == Some(expected_size) {
            return Ok(DestinationState::Satisfied(existing));
        }

        Err(AppError::destination_conflict(format!(
            "{} already exists with {} bytes; source has {expected_size} bytes",
            existing.path,
            existing.size()
        )))
    }

    /// Write `source` into `folder` as `name` using `strategy`.
    ///
    /// The destination must already be [`DestinationState::Vacant`].
    pub async fn execute_into_folder(
        &self,
        strategy: TransferStrategy,
        source: TransferLocator,
        folder: &DataDescriptor,
        name: &str,
        expected_size: u64,
    ) -> Result<TransferReport, AppError> {
        match strategy {
            TransferStrategy::StreamedPipeCopy => {
                let target = self
                    .store
                    .create_file_with_upload_url(&folder.project_id, &folder.data_id, name)
                    .await?;
                let plan = TransferPlan {
                    strategy,
                    source,
                    destination: TransferLocator::Presigned(target.url),
                    expected_size_bytes: Some(expected_size),
                };
                Ok(self.executors.execute(&plan, None).await?)
            }
            TransferStrategy::SizeAwareStream => {
                let credentials = self
                    .store
                    .folder_credentials(&folder.project_id, &folder.data_id)
                    .await?;
                let plan = TransferPlan {
                    strategy,
                    source,
                    destination: TransferLocator::S3(S3Uri::new(
                        &credentials.bucket,
                        credentials.object_key(name),
                    )),
                    expected_size_bytes: Some(expected_size),
                };
                Ok(self.executors.execute(&plan, Some(&credentials)).await?)
            }
            TransferStrategy::ServerSideMove => Err(AppError::internal(
                "Server-side moves are not uploads into a folder",
            )),
        }
    }

    /// Copy a file from the storage service into another folder under the
    /// same name. Returns `skip` when an object of the same size is already
    /// there.
    pub async fn upload_single_part(
        &self,
        source: &DataRef,
        destination_folder: &DataRef,
    ) -> Result<TransferOutcome, AppError> {
        let source = self.resolver.resolve_ref(source).await?;
        if !source.is_file() {
            return Err(AppError::validation(format!("{} is not a file", source.path)));
        }
        let folder = self.resolver.resolve_folder_ref(destination_folder).await?;
        let size = source
            .file_size_in_bytes
            .ok_or_else(|| AppError::external_service(format!("{} has no size", source.path)))?;

        if let DestinationState::Satisfied(existing) =
            self.prepare_destination(&folder, &source.name, size).await?
        {
            info!(path = %existing.path, size, "Destination already holds object, skipping");
            return Ok(TransferOutcome::Skip);
        }

        let structure = if source.is_multi_part() {
            PartStructure::MultiPart
        } else {
            PartStructure::SinglePart
        };
        let strategy = select(SourceOrigin::Provider, structure, TransferIntent::Copy);
        let download = self
            .store
            .create_download_url(&source.project_id, &source.data_id)
            .await?;

        self.execute_into_folder(
            strategy,
            TransferLocator::Presigned(download),
            &folder,
            &source.name,
            size,
        )
        .await
        .inspect_err(|e| warn!(source = %source.path, error = %e, "Upload failed"))?;

        Ok(TransferOutcome::Success)
    }
}
