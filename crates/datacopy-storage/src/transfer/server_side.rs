//! Server-side move: copy inside the object store, then delete the original.
//!
//! A failed delete after a completed copy is reported as
//! [`TransferError::SourceRetained`], separate from a failed copy.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use chrono::Utc;

use datacopy_core::config::TransferConfig;
use datacopy_core::types::{S3Uri, ScopedCredentials};
use datacopy_entity::transfer::{TransferLocator, TransferPlan, TransferReport, TransferStrategy};

use super::multipart::{part_size_for, upload_id_of};
use super::{TransferError, TransferExecutor};
use crate::s3::{copy_source, scoped_client};

/// Moves an object between two keys without streaming it through this
/// process. Objects above the single-request copy limit are copied part by
/// part.
#[derive(Debug, Clone)]
pub struct ServerSideMove {
    multipart_threshold: u64,
    min_part_size: u64,
    max_parts: u64,
}

impl ServerSideMove {
    /// Executor with limits taken from the `[transfer]` section.
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            multipart_threshold: config.multipart_copy_threshold_bytes,
            min_part_size: config.min_part_size_bytes,
            max_parts: config.max_parts,
        }
    }

    fn endpoints(plan: &TransferPlan) -> Result<(&S3Uri, &S3Uri), TransferError> {
        match (&plan.source, &plan.destination) {
            (TransferLocator::S3(src), TransferLocator::S3(dst)) if src != dst => Ok((src, dst)),
            (TransferLocator::S3(_), TransferLocator::S3(_)) => Err(TransferError::UnsupportedPlan {
                strategy: TransferStrategy::ServerSideMove,
                detail: "an object onto itself".to_string(),
            }),
            _ => Err(TransferError::UnsupportedPlan {
                strategy: TransferStrategy::ServerSideMove,
                detail: "locators other than S3 objects".to_string(),
            }),
        }
    }

    async fn object_size(client: &Client, source: &S3Uri) -> Result<u64, TransferError> {
        let head = client
            .head_object()
            .bucket(&source.bucket)
            .key(&source.key)
            .send()
            .await
            .map_err(|e| TransferError::s3("HeadObject", e.into_service_error()))?;
        head.content_length()
            .and_then(|len| u64::try_from(len).ok())
            .ok_or_else(|| TransferError::S3 {
                operation: "HeadObject",
                detail: format!("{source} has no content length"),
            })
    }

    async fn copy_whole(
        client: &Client,
        source: &S3Uri,
        destination: &S3Uri,
    ) -> Result<(), TransferError> {
        client
            .copy_object()
            .copy_source(copy_source(source))
            .bucket(&destination.bucket)
            .key(&destination.key)
            .send()
            .await
            .map_err(|e| TransferError::s3("CopyObject", e.into_service_error()))?;
        Ok(())
    }

    async fn copy_in_parts(
        &self,
        client: &Client,
        source: &S3Uri,
        destination: &S3Uri,
        size: u64,
    ) -> Result<u32, TransferError> {
        let part_size = part_size_for(size, self.min_part_size, self.max_parts);
        let created = client
            .create_multipart_upload()
            .bucket(&destination.bucket)
            .key(&destination.key)
            .send()
            .await
            .map_err(|e| TransferError::s3("CreateMultipartUpload", e.into_service_error()))?;
        let upload_id = upload_id_of(&created, destination)?;

        let result = async {
            let mut parts = Vec::new();
            let mut offset = 0;
            while offset < size {
                let end = (offset + part_size).min(size) - 1;
                let part_number = i32::try_from(parts.len() + 1).map_err(|_| TransferError::S3 {
                    operation: "UploadPartCopy",
                    detail: "too many parts".to_string(),
                })?;
                let output = client
                    .upload_part_copy()
                    .bucket(&destination.bucket)
                    .key(&destination.key)
                    .upload_id(&upload_id)
                    .part_number(part_number)
                    .copy_source(copy_source(source))
                    .copy_source_range(format!("bytes={offset}-{end}"))
                    .send()
                    .await
                    .map_err(|e| TransferError::s3("UploadPartCopy", e.into_service_error()))?;
                let e_tag = output
                    .copy_part_result()
                    .and_then(|r| r.e_tag())
                    .unwrap_or_default();
                parts.push(
                    CompletedPart::builder()
                        .part_number(part_number)
                        .e_tag(e_tag)
                        .build(),
                );
                offset = end + 1;
            }
            let count = u32::try_from(parts.len()).unwrap_or(u32::MAX);
            client
                .complete_multipart_upload()
                .bucket(&destination.bucket)
                .key(&destination.key)
                .upload_id(&upload_id)
                .multipart_upload(
                    CompletedMultipartUpload::builder()
                        .set_parts(Some(parts))
                        .build(),
                )
                .send()
                .await
                .map_err(|e| TransferError::s3("CompleteMultipartUpload", e.into_service_error()))?;
            Ok::<u32, TransferError>(count)
        }
        .await;

        if result.is_err() {
            if let Err(e) = client
                .abort_multipart_upload()
                .bucket(&destination.bucket)
                .key(&destination.key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                tracing::warn!(
                    destination = %destination,
                    error = %e.into_service_error(),
                    "Failed to abort multipart copy"
                );
            }
        }
        result
    }
}

#[async_trait]
impl TransferExecutor for ServerSideMove {
    fn strategy(&self) -> TransferStrategy {
        TransferStrategy::ServerSideMove
    }

    async fn execute(
        &self,
        plan: &TransferPlan,
        credentials: Option<&ScopedCredentials>,
    ) -> Result<TransferReport, TransferError> {
        let (source, destination) = Self::endpoints(plan)?;
        let credentials =
            credentials.ok_or(TransferError::MissingCredentials(TransferStrategy::ServerSideMove))?;
        let started_at = Utc::now();
        let client = scoped_client(credentials);

        let size = match plan.expected_size_bytes {
            Some(size) => size,
            None => Self::object_size(&client, source).await?,
        };

        let parts = if size > self.multipart_threshold {
            tracing::info!(
                source = %source,
                destination = %destination,
                size_bytes = size,
                "Object exceeds single-request copy limit, copying in parts"
            );
            self.copy_in_parts(&client, source, destination, size).await?
        } else {
            Self::copy_whole(&client, source, destination).await?;
            1
        };

        client
            .delete_object()
            .bucket(&source.bucket)
            .key(&source.key)
            .send()
            .await
            .map_err(|e| TransferError::SourceRetained {
                original: source.clone(),
                detail: e.into_service_error().to_string(),
            })?;

        Ok(TransferReport {
            strategy: TransferStrategy::ServerSideMove,
            bytes_streamed: 0,
            parts,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datacopy_entity::transfer::PresignedUrl;

    fn creds() -> ScopedCredentials {
        ScopedCredentials {
            access_key: "a".to_string(),
            secret_key: "s".to_string(),
            session_token: "t".to_string(),
            region: "us-east-1".to_string(),
            bucket: "b".to_string(),
            object_prefix: "p".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rejects_move_onto_itself() {
        let executor = ServerSideMove::new(&TransferConfig::default());
        let uri = S3Uri::new("b", "p/a.bam");
        let plan = TransferPlan {
            strategy: TransferStrategy::ServerSideMove,
            source: TransferLocator::S3(uri.clone()),
            destination: TransferLocator::S3(uri),
            expected_size_bytes: Some(1),
        };
        let err = executor.execute(&plan, Some(&creds())).await.unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedPlan { .. }));
    }

    #[tokio::test]
    async fn test_rejects_presigned_locators() {
        let executor = ServerSideMove::new(&TransferConfig::default());
        let plan = TransferPlan {
            strategy: TransferStrategy::ServerSideMove,
            source: TransferLocator::Presigned(PresignedUrl::new("https://h/a")),
            destination: TransferLocator::S3(S3Uri::new("b", "k")),
            expected_size_bytes: Some(1),
        };
        let err = executor.execute(&plan, Some(&creds())).await.unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedPlan { .. }));
    }

    #[tokio::test]
    async fn test_requires_credentials() {
        let executor = ServerSideMove::new(&TransferConfig::default());
        let plan = TransferPlan {
            strategy: TransferStrategy::ServerSideMove,
            source: TransferLocator::S3(S3Uri::new("b", "p/a")),
            destination: TransferLocator::S3(S3Uri::new("b", "p/b")),
            expected_size_bytes: Some(1),
        };
        let err = executor.execute(&plan, None).await.unwrap_err();
        assert!(matches!(err, TransferError::MissingCredentials(_)));
    }
}
