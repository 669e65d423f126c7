//! S3 client construction, external object lookup, and presigning.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;

use datacopy_core::error::{AppError, ErrorKind};
use datacopy_core::result::AppResult;
use datacopy_core::types::{S3Uri, ScopedCredentials};
use datacopy_entity::transfer::PresignedUrl;

/// Build an S3 client that authenticates with folder-scoped credentials.
pub fn scoped_client(credentials: &ScopedCredentials) -> Client {
    let provider = Credentials::new(
        &credentials.access_key,
        &credentials.secret_key,
        Some(credentials.session_token.clone()),
        None,
        "datacopy-scoped",
    );
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(credentials.region.clone()))
        .credentials_provider(provider)
        .build();
    Client::from_conf(config)
}

/// `bucket/key` value for the `x-amz-copy-source` header, key segments URL-encoded.
pub fn copy_source(uri: &S3Uri) -> String {
    let key = uri
        .key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{key}", uri.bucket)
}

/// Size and content tag of an object in an external bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalObjectHead {
    /// Object size in bytes.
    pub size_bytes: u64,
    /// Entity tag with surrounding quotes removed.
    pub e_tag: String,
}

impl ExternalObjectHead {
    /// Whether the object was written by a multipart upload.
    pub fn is_multipart(&self) -> bool {
        self.e_tag.contains('-')
    }
}

/// Read access to objects in buckets outside the storage service.
#[async_trait]
pub trait ExternalObjects: Send + Sync + fmt::Debug + 'static {
    /// Size and tag of an object.
    async fn head(&self, uri: &S3Uri) -> AppResult<ExternalObjectHead>;

    /// Time-limited GET URL for an object.
    async fn presign_get(&self, uri: &S3Uri, expires_in: Duration) -> AppResult<PresignedUrl>;
}

/// [`ExternalObjects`] backed by the ambient AWS credential chain.
#[derive(Debug, Clone)]
pub struct S3ExternalObjects {
    client: Client,
}

impl S3ExternalObjects {
    /// Load the default AWS configuration (environment, profile, or role).
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            client: Client::new(&config),
        }
    }
}

#[async_trait]
impl ExternalObjects for S3ExternalObjects {
    async fn head(&self, uri: &S3Uri) -> AppResult<ExternalObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    AppError::not_found(format!("{uri} does not exist"))
                } else {
                    AppError::with_source(
                        ErrorKind::ExternalService,
                        format!("HeadObject failed for {uri}"),
                        service_error,
                    )
                }
            })?;

        let size_bytes = output
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .ok_or_else(|| AppError::external_service(format!("{uri} has no content length")))?;
        let e_tag = output
            .e_tag()
            .map(|tag| tag.trim_matches('"').to_string())
            .unwrap_or_default();

        Ok(ExternalObjectHead { size_bytes, e_tag })
    }

    async fn presign_get(&self, uri: &S3Uri, expires_in: Duration) -> AppResult<PresignedUrl> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid presign expiry", e)
        })?;
        let request = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Presigning failed for {uri}"),
                    e,
                )
            })?;
        Ok(PresignedUrl::new(request.uri()))
    }
}

#[cfg(any(test, feature = "testing"))]
pub use self::memory::MemoryExternalObjects;

#[cfg(any(test, feature = "testing"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    use super::*;

    /// In-memory external bucket contents.
    #[derive(Debug, Default)]
    pub struct MemoryExternalObjects {
        objects: Mutex<HashMap<S3Uri, ExternalObjectHead>>,
    }

    impl MemoryExternalObjects {
        /// Empty set of external objects.
        pub fn new() -> Self {
            Self::default()
        }

        /// Register an object.
        pub fn insert(&self, uri: &str, size_bytes: u64, e_tag: &str) {
            if let Ok(uri) = S3Uri::parse(uri) {
                self.objects
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(
                        uri,
                        ExternalObjectHead {
                            size_bytes,
                            e_tag: e_tag.to_string(),
                        },
                    );
            }
        }
    }

    #[async_trait]
    impl ExternalObjects for MemoryExternalObjects {
        async fn head(&self, uri: &S3Uri) -> AppResult<ExternalObjectHead> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(uri)
                .cloned()
                .ok_or_else(|| AppError::not_found(format!("{uri} does not exist")))
        }

        async fn presign_get(
            &self,
            uri: &S3Uri,
            _expires_in: Duration,
        ) -> AppResult<PresignedUrl> {
            self.head(uri).await?;
            Ok(PresignedUrl::new(format!(
                "memory://external/{}/{}",
                uri.bucket, uri.key
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_source_encodes_segments() {
        let uri = S3Uri::new("bucket", "dir with space/a+b.bam");
        assert_eq!(copy_source(&uri), "bucket/dir%20with%20space/a%2Bb.bam");
    }

    #[test]
    fn test_multipart_detection_uses_dash() {
        let head = ExternalObjectHead {
            size_bytes: 1,
            e_tag: "abc-4".to_string(),
        };
        assert!(head.is_multipart());
        let head = ExternalObjectHead {
            size_bytes: 1,
            e_tag: "abcdef".to_string(),
        };
        assert!(!head.is_multipart());
    }

    #[tokio::test]
    async fn test_memory_external_objects() {
        let objects = MemoryExternalObjects::new();
        objects.insert("s3://b/k.fastq", 10, "x-2");
        let head = objects.head(&S3Uri::parse("s3://b/k.fastq").unwrap()).await.unwrap();
        assert_eq!(head.size_bytes, 10);
        assert!(
            objects
                .head(&S3Uri::parse("s3://b/missing").unwrap())
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}
