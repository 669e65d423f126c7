//! Uploads from external S3 buckets into the storage service.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use datacopy_core::error::AppError;
use datacopy_core::types::S3Uri;
use datacopy_entity::data::{DataRef, PartStructure};
use datacopy_entity::rename::ExternalSourceMetadata;
use datacopy_entity::transfer::{TransferLocator, TransferOutcome};
use datacopy_storage::s3::ExternalObjects;

use super::selector::{SourceOrigin, TransferIntent, select};
use super::service::{DestinationState, TransferService};

/// Brings objects from outside buckets into storage service folders.
#[derive(Debug, Clone)]
pub struct ExternalTransferService {
    /// Idempotent upload contract and executors.
    transfers: TransferService,
    /// Read access to external buckets.
    external: Arc<dyn ExternalObjects>,
    /// Validity of presigned GET URLs.
    presign_expiry: Duration,
}

impl ExternalTransferService {
    /// Creates a new external transfer service.
    pub fn new(
        transfers: TransferService,
        external: Arc<dyn ExternalObjects>,
        presign_expiry: Duration,
    ) -> Self {
        Self {
            transfers,
            external,
            presign_expiry,
        }
    }

    /// Size of an external object and whether it was written in parts.
    pub async fn source_metadata(&self, source: &S3Uri) -> Result<ExternalSourceMetadata, AppError> {
        let head = self.external.head(source).await?;
        Ok(ExternalSourceMetadata {
            source_file_size_in_bytes: head.size_bytes,
            is_multipart_file: head.is_multipart(),
        })
    }

    /// Upload an external object into `destination_folder` under its own name.
    ///
    /// `metadata` may carry a previously fetched [`source_metadata`](Self::source_metadata)
    /// result; otherwise the object is looked up first.
    pub async fn upload_external(
        &self,
        source: &S3Uri,
        destination_folder: &DataRef,
        metadata: Option<ExternalSourceMetadata>,
    ) -> Result<TransferOutcome, AppError> {
        let metadata = match metadata {
            Some(known) => known,
            None => self.source_metadata(source).await?,
        };
        let name = source.name();
        if name.is_empty() {
            return Err(AppError::validation(format!("{source} does not name an object")));
        }

        let folder = self
            .transfers
            .resolver()
            .resolve_folder_ref(destination_folder)
            .await?;
        let size = metadata.source_file_size_in_bytes;

        if let DestinationState::Satisfied(existing) =
            self.transfers.prepare_destination(&folder, name, size).await?
        {
            info!(path = %existing.path, size, "Destination already holds object, skipping");
            return Ok(TransferOutcome::Skip);
        }

        let structure = if metadata.is_multipart_file {
            PartStructure::MultiPart
        } else {
            PartStructure::SinglePart
        };
        let strategy = select(SourceOrigin::External, structure, TransferIntent::Copy);
        let download = self.external.presign_get(source, self.presign_expiry).await?;

        info!(source = %source, destination = %folder.path, %strategy, "Uploading external object");
        self.transfers
            .execute_into_folder(strategy, TransferLocator::Presigned(download), &folder, name, size)
            .await?;
        Ok(TransferOutcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::PartialStateReconciler;
    use crate::resolver::DataResolver;
    use datacopy_core::ErrorKind;
    use datacopy_entity::transfer::TransferStrategy;
    use datacopy_storage::TransferExecutors;
    use datacopy_storage::providers::MemoryDataStore;
    use datacopy_storage::s3::MemoryExternalObjects;
    use datacopy_storage::transfer::RecordingExecutor;

    struct Fixture {
        store: Arc<MemoryDataStore>,
        external: Arc<MemoryExternalObjects>,
        pipe: RecordingExecutor,
        stream: RecordingExecutor,
        service: ExternalTransferService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryDataStore::new());
        let external = Arc::new(MemoryExternalObjects::new());
        let pipe = RecordingExecutor::new(TransferStrategy::StreamedPipeCopy).with_store(store.clone());
        let stream = RecordingExecutor::new(TransferStrategy::SizeAwareStream).with_store(store.clone());
        let executors = TransferExecutors::new()
            .with(Arc::new(pipe.clone()))
            .with(Arc::new(stream.clone()));
        let transfers = TransferService::new(
            store.clone(),
            DataResolver::new(store.clone()),
            PartialStateReconciler::new(store.clone(), Duration::from_secs(5)),
            Arc::new(executors),
        );
        let service = ExternalTransferService::new(
            transfers,
            external.clone(),
            Duration::from_secs(3600),
        );
        Fixture {
            store,
            external,
            pipe,
            stream,
            service,
        }
    }

    #[tokio::test]
    async fn test_source_metadata() {
        let f = fixture();
        f.external.insert("s3://lab/run/a.fastq.gz", 2048, "d41d8cd9-4");
        let metadata = f
            .service
            .source_metadata(&S3Uri::parse("s3://lab/run/a.fastq.gz").unwrap())
            .await
            .unwrap();
        assert_eq!(metadata.source_file_size_in_bytes, 2048);
        assert!(metadata.is_multipart_file);
    }

    #[tokio::test]
    async fn test_single_part_external_pipes_then_skips() {
        let f = fixture();
        f.external.insert("s3://lab/run/a.txt", 64, "d41d8cd98f00b204");
        let folder = f.store.add_folder("dst", "/out/").data_ref();
        let source = S3Uri::parse("s3://lab/run/a.txt").unwrap();

        let first = f.service.upload_external(&source, &folder, None).await.unwrap();
        assert_eq!(first, TransferOutcome::Success);
        assert_eq!(f.pipe.count(), 1);
        assert_eq!(f.store.find("dst", "/out/a.txt").unwrap().size(), 64);

        let second = f.service.upload_external(&source, &folder, None).await.unwrap();
        assert_eq!(second, TransferOutcome::Skip);
        assert_eq!(f.pipe.count(), 1);
    }

    #[tokio::test]
    async fn test_multi_part_external_streams_into_bucket() {
        let f = fixture();
        f.external.insert("s3://lab/run/a.bam", 30_000_000, "abc-4");
        let folder = f.store.add_folder("dst", "/out/").data_ref();

        let outcome = f
            .service
            .upload_external(&S3Uri::parse("s3://lab/run/a.bam").unwrap(), &folder, None)
            .await
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Success);

        let recorded = f.stream.transfers();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].had_credentials);
        assert_eq!(recorded[0].plan.expected_size_bytes, Some(30_000_000));
        assert_eq!(f.store.find("dst", "/out/a.bam").unwrap().size(), 30_000_000);
    }

    #[tokio::test]
    async fn test_missing_external_object() {
        let f = fixture();
        let folder = f.store.add_folder("dst", "/out/").data_ref();
        let err = f
            .service
            .upload_external(&S3Uri::parse("s3://lab/none.txt").unwrap(), &folder, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
