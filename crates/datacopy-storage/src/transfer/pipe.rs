//! Streamed pipe copy: presigned download piped into a presigned upload.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client};

use datacopy_core::types::ScopedCredentials;
use datacopy_entity::transfer::{
    PresignedUrl, TransferLocator, TransferPlan, TransferReport, TransferStrategy,
};

use super::{TransferError, TransferExecutor, clip_body};

/// Streams bytes from a GET URL straight into a PUT URL without buffering
/// the whole object.
#[derive(Debug, Clone, Default)]
pub struct StreamedPipeCopy {
    client: Client,
}

impl StreamedPipeCopy {
    /// Executor using the given HTTP client. The client should not carry a
    /// request timeout, since large objects take a while.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn endpoints<'a>(
        plan: &'a TransferPlan,
    ) -> Result<(&'a PresignedUrl, &'a PresignedUrl), TransferError> {
        match (&plan.source, &plan.destination) {
            (TransferLocator::Presigned(src), TransferLocator::Presigned(dst)) => Ok((src, dst)),
            _ => Err(TransferError::UnsupportedPlan {
                strategy: TransferStrategy::StreamedPipeCopy,
                detail: "locators other than presigned URLs".to_string(),
            }),
        }
    }
}

#[async_trait]
impl TransferExecutor for StreamedPipeCopy {
    fn strategy(&self) -> TransferStrategy {
        TransferStrategy::StreamedPipeCopy
    }

    async fn execute(
        &self,
        plan: &TransferPlan,
        _credentials: Option<&ScopedCredentials>,
    ) -> Result<TransferReport, TransferError> {
        let (source, destination) = Self::endpoints(plan)?;
        let started_at = Utc::now();

        let download = self
            .client
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

        let content_length = plan.expected_size_bytes.or(download.content_length());
        let streamed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&streamed);
        let stream = download.bytes_stream().inspect_ok(move |chunk| {
            counter.fetch_add(chunk.len() as u64, Ordering::Relaxed);
        });

        let mut upload = self
            .client
            .put(destination.expose())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(Body::wrap_stream(stream));
        if let Some(length) = content_length {
            upload = upload.header(CONTENT_LENGTH, length);
        }

        let response = upload.send().await.map_err(|e| TransferError::Request {
            stage: "upload",
            detail: e.without_url().to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransferError::Http {
                stage: "upload",
                status: status.as_u16(),
                body: clip_body(body),
            });
        }

        let actual = streamed.load(Ordering::Relaxed);
        if let Some(expected) = plan.expected_size_bytes {
            if expected != actual {
                return Err(TransferError::SizeMismatch { expected, actual });
            }
        }

        Ok(TransferReport {
            strategy: TransferStrategy::StreamedPipeCopy,
            bytes_streamed: actual,
            parts: 1,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datacopy_core::ErrorKind;
    use datacopy_core::error::AppError;
    use datacopy_core::types::S3Uri;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const OBJECT_SIZE: usize = 300 * 1024;

    #[derive(Debug, Clone)]
    struct ReceivedPut {
        path: String,
        content_length: Option<u64>,
        body: Vec<u8>,
    }

    /// Minimal HTTP/1.1 endpoint standing in for both presigned URLs.
    ///
    /// `GET /object` serves `OBJECT_SIZE` bytes, `GET /denied` answers 403,
    /// `PUT /upload` stores the body and `PUT /expired` answers 403.
    async fn serve() -> (SocketAddr, Arc<Mutex<Vec<ReceivedPut>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let puts = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&puts);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(handle(stream, Arc::clone(&recorded)));
            }
        });
        (addr, puts)
    }

    async fn handle(mut stream: TcpStream, puts: Arc<Mutex<Vec<ReceivedPut>>>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 16 * 1024];
        let head_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next().unwrap_or_default().split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let path = request_line.next().unwrap_or_default().to_string();
        let content_length = lines
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<u64>().ok());

        let mut body = buf[head_end..].to_vec();
        let wanted = usize::try_from(content_length.unwrap_or(0)).unwrap();
        while body.len() < wanted {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        let (status, payload) = match (method.as_str(), path.as_str()) {
            ("GET", "/object") => ("200 OK", vec![7u8; OBJECT_SIZE]),
            ("GET", "/denied") => (
                "403 Forbidden",
                b"<Error><Code>AccessDenied</Code></Error>".to_vec(),
            ),
            ("PUT", "/upload") => {
                puts.lock().unwrap().push(ReceivedPut {
                    path,
                    content_length,
                    body,
                });
                ("200 OK", Vec::new())
            }
            ("PUT", "/expired") => (
                "403 Forbidden",
                b"<Error><Code>SignatureDoesNotMatch</Code></Error>".to_vec(),
            ),
            _ => ("404 Not Found", Vec::new()),
        };
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            payload.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.write_all(&payload).await.unwrap();
        stream.shutdown().await.ok();
    }

    fn plan(addr: SocketAddr, source: &str, destination: &str, size: Option<u64>) -> TransferPlan {
        TransferPlan {
            strategy: TransferStrategy::StreamedPipeCopy,
            source: TransferLocator::Presigned(PresignedUrl::new(format!("http://{addr}{source}"))),
            destination: TransferLocator::Presigned(PresignedUrl::new(format!(
                "http://{addr}{destination}"
            ))),
            expected_size_bytes: size,
        }
    }

    #[tokio::test]
    async fn test_pipes_download_into_upload_with_content_length() {
        let (addr, puts) = serve().await;
        let executor = StreamedPipeCopy::default();
        let expected = OBJECT_SIZE as u64;

        let report = executor
            .execute(&plan(addr, "/object", "/upload", Some(expected)), None)
            .await
            .unwrap();

        assert_eq!(report.strategy, TransferStrategy::StreamedPipeCopy);
        assert_eq!(report.bytes_streamed, expected);
        let puts = puts.lock().unwrap().clone();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].path, "/upload");
        assert_eq!(puts[0].content_length, Some(expected));
        assert_eq!(puts[0].body.len(), OBJECT_SIZE);
        assert!(puts[0].body.iter().all(|b| *b == 7));
    }

    #[tokio::test]
    async fn test_denied_download_carries_response_body() {
        let (addr, puts) = serve().await;
        let executor = StreamedPipeCopy::default();

        let err = executor
            .execute(&plan(addr, "/denied", "/upload", Some(10)), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransferError::Http {
                stage: "download",
                status: 403,
                ..
            }
        ));

        let err: AppError = err.into();
        assert_eq!(err.kind, ErrorKind::ChildTransferFailure);
        assert!(err.message.contains("403"));
        assert!(err.message.contains("AccessDenied"));
        assert!(puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_upload_carries_response_body() {
        let (addr, _) = serve().await;
        let executor = StreamedPipeCopy::default();

        let err = executor
            .execute(&plan(addr, "/object", "/expired", Some(OBJECT_SIZE as u64)), None)
            .await
            .unwrap_err();
        match err {
            TransferError::Http { stage, status, body } => {
                assert_eq!(stage, "upload");
                assert_eq!(status, 403);
                assert!(body.contains("SignatureDoesNotMatch"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_s3_locators() {
        let executor = StreamedPipeCopy::default();
        let plan = TransferPlan {
            strategy: TransferStrategy::StreamedPipeCopy,
            source: TransferLocator::S3(S3Uri::new("b", "k")),
            destination: TransferLocator::Presigned(PresignedUrl::new("https://h/x")),
            expected_size_bytes: Some(1),
        };
        let err = executor.execute(&plan, None).await.unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedPlan { .. }));
    }
}
