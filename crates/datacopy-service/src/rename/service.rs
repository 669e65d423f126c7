//! Rename (move) of a single object: transfer, then delete the original.
//!
//! Rename is a two-step commit. If the transfer succeeds and the delete of
//! the original fails, the caller gets `RENAME_INCOMPLETE` naming the source
//! and can retry just the delete with [`RenameService::complete_rename`].

use std::sync::Arc;

use tracing::{info, warn};

use datacopy_core::error::AppError;
use datacopy_core::types::{DataUri, S3Uri};
use datacopy_entity::data::{DataDescriptor, DataRef, PartStructure};
use datacopy_entity::transfer::{
    TransferLocator, TransferOutcome, TransferPlan, TransferReport, TransferStrategy,
};
use datacopy_storage::{DataStore, TransferError, TransferExecutors};

use crate::resolver::DataResolver;
use crate::transfer::{DestinationState, SourceOrigin, TransferIntent, TransferService, select};

/// Moves an object to a new path or name.
#[derive(Debug, Clone)]
pub struct RenameService {
    /// Remote storage service.
    store: Arc<dyn DataStore>,
    /// Locator resolver.
    resolver: DataResolver,
    /// Idempotent upload contract.
    transfers: TransferService,
    /// Executors, for server-side moves.
    executors: Arc<TransferExecutors>,
}

impl RenameService {
    /// Creates a new rename service.
    pub fn new(
        store: Arc<dyn DataStore>,
        resolver: DataResolver,
        transfers: TransferService,
        executors: Arc<TransferExecutors>,
    ) -> Self {
        Self {
            store,
            resolver,
            transfers,
            executors,
        }
    }

    /// Move `source` to `output`, creating the output folder if needed.
    pub async fn rename(
        &self,
        source: &DataRef,
        output: &DataUri,
    ) -> Result<TransferOutcome, AppError> {
        if output.is_folder() || output.name().is_empty() {
            return Err(AppError::validation(format!(
                "Rename output {output} must name a file"
            )));
        }

        let source = self.resolver.resolve_ref(source).await?;
        if !source.is_file() {
            return Err(AppError::validation(format!("{} is not a file", source.path)));
        }
        if source.uri(self.resolver.scheme()) == *output {
            info!(path = %source.path, "Source already at output location");
            return Ok(TransferOutcome::Skip);
        }

        let name = output.name();
        let folder = self.resolver.resolve_or_create_folder(&output.parent()).await?;
        let size = source
            .file_size_in_bytes
            .ok_or_else(|| AppError::external_service(format!("{} has no size", source.path)))?;

        match self.transfers.prepare_destination(&folder, name, size).await? {
            DestinationState::Satisfied(existing) if existing.data_id == source.data_id => {
                return Err(AppError::destination_conflict(format!(
                    "{output} resolves to the source object {}",
                    source.path
                )));
            }
            DestinationState::Satisfied(existing) => {
                info!(path = %existing.path, "Output already written, removing source");
                self.delete_source(&source, output).await?;
                return Ok(TransferOutcome::Skip);
            }
            DestinationState::Vacant => {}
        }

        let strategy = if source.is_multi_part() {
            // Scoped credentials cover one folder, so only a rename within
            // the source's own folder can move server-side.
            let source_folder = self
                .resolver
                .resolve_uri(&source.uri(self.resolver.scheme()).parent())
                .await?;
            let intent = if source_folder.data_ref() == folder.data_ref() {
                TransferIntent::Move
            } else {
                TransferIntent::Copy
            };
            select(SourceOrigin::Provider, PartStructure::MultiPart, intent)
        } else {
            select(SourceOrigin::Provider, PartStructure::SinglePart, TransferIntent::Move)
        };

        match strategy {
            TransferStrategy::ServerSideMove => {
                self.move_server_side(&source, &folder, name, size, output).await?;
            }
            strategy @ (TransferStrategy::StreamedPipeCopy | TransferStrategy::SizeAwareStream) => {
                let download = self
                    .store
                    .create_download_url(&source.project_id, &source.data_id)
                    .await?;
                self.transfers
                    .execute_into_folder(
                        strategy,
                        TransferLocator::Presigned(download),
                        &folder,
                        name,
                        size,
                    )
                    .await?;
                self.delete_source(&source, output).await?;
            }
        }

        info!(source = %source.path, output = %output, "Renamed object");
        Ok(TransferOutcome::Success)
    }

    /// Retry the delete of a renamed object's original. Succeeds if it is
    /// already gone.
    pub async fn complete_rename(&self, source: &DataRef) -> Result<(), AppError> {
        match self.store.delete(&source.project_id, &source.data_id).await {
            Ok(()) => {
                info!(project_id = %source.project_id, data_id = %source.data_id, "Deleted rename source");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!(project_id = %source.project_id, data_id = %source.data_id, "Rename source already deleted");
                Ok(())
            }
            Err(e) => Err(AppError::rename_incomplete(format!(
                "Failed to delete source {}/{}: {e}",
                source.project_id, source.data_id
            ))),
        }
    }

    async fn delete_source(&self, source: &DataDescriptor, output: &DataUri) -> Result<(), AppError> {
        match self.store.delete(&source.project_id, &source.data_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => {
                warn!(
                    project_id = %source.project_id,
                    data_id = %source.data_id,
                    error = %e,
                    "Transferred but could not delete source"
                );
                Err(AppError::rename_incomplete(format!(
                    "Transferred {} to {output} but failed to delete source {}/{}: {e}",
                    source.path, source.project_id, source.data_id
                )))
            }
        }
    }

    /// Move within `folder`, which holds both the source and the output.
    async fn move_server_side(
        &self,
        source: &DataDescriptor,
        folder: &DataDescriptor,
        name: &str,
        size: u64,
        output: &DataUri,
    ) -> Result<TransferReport, AppError> {
        let credentials = self
            .store
            .folder_credentials(&folder.project_id, &folder.data_id)
            .await?;
        let plan = TransferPlan {
            strategy: TransferStrategy::ServerSideMove,
            source: TransferLocator::S3(S3Uri::new(
                &credentials.bucket,
                credentials.object_key(&source.name),
            )),
            destination: TransferLocator::S3(S3Uri::new(
                &credentials.bucket,
                credentials.object_key(name),
            )),
            expected_size_bytes: Some(size),
        };

        match self.executors.execute(&plan, Some(&credentials)).await {
            Ok(report) => Ok(report),
            Err(e @ TransferError::SourceRetained { .. }) => {
                warn!(
                    project_id = %source.project_id,
                    data_id = %source.data_id,
                    error = %e,
                    "Moved but could not delete source"
                );
                Err(AppError::rename_incomplete(format!(
                    "Moved {} to {output} but failed to delete source {}/{}: {e}",
                    source.path, source.project_id, source.data_id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}
