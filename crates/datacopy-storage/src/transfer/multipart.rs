//! Size-aware streaming into an S3 multipart upload.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures::StreamExt;

use datacopy_core::config::TransferConfig;
use datacopy_core::types::{S3Uri, ScopedCredentials};
use datacopy_entity::transfer::{
    PresignedUrl, TransferLocator, TransferPlan, TransferReport, TransferStrategy,
};

use super::{TransferError, TransferExecutor, clip_body};
use crate::s3::scoped_client;

/// Part size for an object of `expected` bytes: at least `min_part`, and
/// large enough that the upload fits in `max_parts` parts.
pub fn part_size_for(expected: u64, min_part: u64, max_parts: u64) -> u64 {
    min_part.max(expected.div_ceil(max_parts.max(1)))
}

/// Upload id of a freshly created multipart upload.
pub(crate) fn upload_id_of(
    created: &CreateMultipartUploadOutput,
    destination: &S3Uri,
) -> Result<String, TransferError> {
    created
        .upload_id()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TransferError::S3 {
            operation: "CreateMultipartUpload",
            detail: format!("no upload id returned for {destination}"),
        })
}

/// Streams a presigned download into a multipart upload in the destination
/// bucket, using folder-scoped credentials.
#[derive(Debug, Clone)]
pub struct SizeAwareStream {
    http: reqwest::Client,
    min_part_size: u64,
    max_parts: u64,
}

impl SizeAwareStream {
    /// Executor with part sizing taken from the `[transfer]` section.
    pub fn new(http: reqwest::Client, config: &TransferConfig) -> Self {
        Self {
            http,
            min_part_size: config.min_part_size_bytes,
            max_parts: config.max_parts,
        }
    }

    fn endpoints(plan: &TransferPlan) -> Result<(&PresignedUrl, &S3Uri), TransferError> {
        match (&plan.source, &plan.destination) {
            (TransferLocator::Presigned(src), TransferLocator::S3(dst)) => Ok((src, dst)),
            _ => Err(TransferError::UnsupportedPlan {
                strategy: TransferStrategy::SizeAwareStream,
                detail: "anything but presigned URL to S3 object".to_string(),
            }),
        }
    }

    async fn upload_parts(
        &self,
        client: &Client,
        download: reqwest::Response,
        destination: &S3Uri,
        upload_id: &str,
        part_size: u64,
    ) -> Result<(Vec<CompletedPart>, u64), TransferError> {
        let part_size = usize::try_from(part_size).unwrap_or(usize::MAX);
        let mut stream = download.bytes_stream();
        let mut buffer = BytesMut::with_capacity(part_size.min(64 * 1024 * 1024));
        let mut parts = Vec::new();
        let mut total: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TransferError::Request {
                stage: "download",
                detail: e.without_url().to_string(),
            })?;
            total += chunk.len() as u64;
            buffer.extend_from_slice(&chunk);
            while buffer.len() >= part_size {
                let body = buffer.split_to(part_size).freeze();
                let part = upload_part(client, destination, upload_id, parts.len() + 1, body).await?;
                parts.push(part);
            }
        }
        if !buffer.is_empty() || parts.is_empty() {
            let body = buffer.freeze();
            let part = upload_part(client, destination, upload_id, parts.len() + 1, body).await?;
            parts.push(part);
        }
        Ok((parts, total))
    }
}

async fn upload_part(
    client: &Client,
    destination: &S3Uri,
    upload_id: &str,
    index: usize,
    body: Bytes,
) -> Result<CompletedPart, TransferError> {
    let part_number = i32::try_from(index).map_err(|_| TransferError::S3 {
        operation: "UploadPart",
        detail: format!("part number {index} out of range"),
    })?;
    let output = client
        .upload_part()
        .bucket(&destination.bucket)
        .key(&destination.key)
        .upload_id(upload_id)
        .part_number(part_number)
        .body(ByteStream::from(body))
        .send()
        .await
        .map_err(|e| TransferError::s3("UploadPart", e.into_service_error()))?;

    tracing::debug!(part_number, "Uploaded part");
    Ok(CompletedPart::builder()
        .part_number(part_number)
        .e_tag(output.e_tag().unwrap_or_default())
        .build())
}

async fn abort(client: &Client, destination: &S3Uri, upload_id: &str) {
    if let Err(e) = client
        .abort_multipart_upload()
        .bucket(&destination.bucket)
        .key(&destination.key)
        .upload_id(upload_id)
        .send()
        .await
    {
        tracing::warn!(
            destination = %destination,
            error = %e.into_service_error(),
            "Failed to abort multipart upload"
        );
    }
}

#[async_trait]
impl TransferExecutor for SizeAwareStream {
    fn strategy(&self) -> TransferStrategy {
        TransferStrategy::SizeAwareStream
    }

    async fn execute(
        &self,
        plan: &TransferPlan,
        credentials: Option<&ScopedCredentials>,
    ) -> Result<TransferReport, TransferError> {
        let (source, destination) = Self::endpoints(plan)?;
        let credentials =
            credentials.ok_or(TransferError::MissingCredentials(TransferStrategy::SizeAwareStream))?;
        let expected = plan
            .expected_size_bytes
            .ok_or(TransferError::MissingSize(TransferStrategy::SizeAwareStream))?;
        let part_size = part_size_for(expected, self.min_part_size, self.max_parts);
        let started_at = Utc::now();

        let download = self
            .http
            .get(source.expose())
            .send()
            .await
            .map_err(|e| TransferError::Request {
                stage: "download",
                detail: e.without_url().to_string(),
            })?;
        let status = download.status();
        if !status.is_success() {
            let body = download.text().await.unwrap_or_default();
            return Err(TransferError::Http {
                stage: "download",
                status: status.as_u16(),
                body: clip_body(body),
            });
        }

        let client = scoped_client(credentials);
        let created = client
            .create_multipart_upload()
            .bucket(&destination.bucket)
            .key(&destination.key)
            .send()
            .await
            .map_err(|e| TransferError::s3("CreateMultipartUpload", e.into_service_error()))?;
        let upload_id = upload_id_of(&created, destination)?;

        tracing::info!(
            destination = %destination,
            expected_size_bytes = expected,
            part_size,
            "Started multipart upload"
        );

        let (parts, total) = match self
            .upload_parts(&client, download, destination, &upload_id, part_size)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                abort(&client, destination, &upload_id).await;
                return Err(e);
            }
        };

        if total != expected {
            abort(&client, destination, &upload_id).await;
            return Err(TransferError::SizeMismatch {
                expected,
                actual: total,
            });
        }

        let part_count = u32::try_from(parts.len()).unwrap_or(u32::MAX);
        let completed = client
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
            .await;
        if let Err(e) = completed {
            abort(&client, destination, &upload_id).await;
            return Err(TransferError::s3(
                "CompleteMultipartUpload",
                e.into_service_error(),
            ));
        }

        Ok(TransferReport {
            strategy: TransferStrategy::SizeAwareStream,
            bytes_streamed: total,
            parts: part_count,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
