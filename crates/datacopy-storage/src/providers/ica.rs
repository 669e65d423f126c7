//! REST provider for an ICA-style project data service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use datacopy_core::config::StoreConfig;
use datacopy_core::error::{AppError, ErrorKind};
use datacopy_core::result::AppResult;
use datacopy_core::types::{DataId, JobId, ProjectId, ScopedCredentials};
use datacopy_entity::data::{DataDescriptor, DataStatus, DataType, ObjectTag};
use datacopy_entity::job::{CopyBatchRequest, CopyJobDescriptor, CopyJobStatus};
use datacopy_entity::transfer::PresignedUrl;

use crate::store::{DataStore, UploadTarget};

const MEDIA_TYPE: &str = "application/vnd.illumina.v3+json";

/// [`DataStore`] backed by the storage service's REST API.
#[derive(Clone)]
pub struct IcaDataStore {
    client: Client,
    api_base: String,
    access_token: String,
    scheme: String,
    page_size: u32,
}

impl std::fmt::Debug for IcaDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcaDataStore")
            .field("api_base", &self.api_base)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl IcaDataStore {
    /// Build a provider from the `[store]` configuration section.
    pub fn new(config: &StoreConfig) -> AppResult<Self> {
        if config.access_token.is_empty() {
            return Err(AppError::configuration(
                "store.access_token is required (DATACOPY__STORE__ACCESS_TOKEN)",
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build HTTP client",
                    e,
                )
            })?;

        tracing::info!(base_url = %config.base_url, "Initializing storage service provider");

        Ok(Self {
            client,
            api_base: format!("{}/api", config.base_url.trim_end_matches('/')),
            access_token: config.access_token.clone(),
            scheme: config.scheme.clone(),
            page_size: config.page_size,
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.get(format!("{}{path}", self.api_base)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.post(format!("{}{path}", self.api_base)))
            .header(CONTENT_TYPE, MEDIA_TYPE)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.access_token)
            .header(ACCEPT, MEDIA_TYPE)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> AppResult<T> {
        let response = send(request, what).await?;
        response.json::<T>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Malformed response for {what}"),
                e,
            )
        })
    }

    async fn list_page(
        &self,
        project_id: &ProjectId,
        query: &str,
        page_token: Option<&str>,
    ) -> AppResult<DataPage> {
        let mut url = format!(
            "/projects/{}/data?{query}&pageSize={}",
            encode(project_id.as_str()),
            self.page_size
        );
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&encode(token));
        }
        self.send_json(self.get(&url), "data listing").await
    }

    async fn list_all(
        &self,
        project_id: &ProjectId,
        query: &str,
    ) -> AppResult<Vec<DataDescriptor>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.list_page(project_id, query, token.as_deref()).await?;
            items.extend(page.items.into_iter().map(|item| item.into_descriptor(project_id)));
            match page.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }
        Ok(items)
    }
}

async fn send(request: RequestBuilder, what: &str) -> AppResult<reqwest::Response> {
    let response = request.send().await.map_err(|e| {
        AppError::with_source(
            ErrorKind::ExternalService,
            format!("Request for {what} failed"),
            e,
        )
    })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::not_found(format!("{what} not found: {body}")));
    }
    Err(AppError::external_service(format!(
        "{what} returned {status}: {body}"
    )))
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn data_type_param(data_type: DataType) -> &'static str {
    match data_type {
        DataType::File => "FILE",
        DataType::Folder => "FOLDER",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataPage {
    #[serde(default)]
    items: Vec<ProjectDataItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectDataItem {
    data: DataItem,
}

#[derive(Debug, Deserialize)]
struct DataItem {
    id: String,
    details: DataDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataDetails {
    name: String,
    path: String,
    data_type: DataType,
    #[serde(default)]
    file_size_in_bytes: Option<u64>,
    #[serde(default, rename = "objectETag")]
    object_etag: Option<String>,
    status: DataStatus,
}

impl ProjectDataItem {
    fn into_descriptor(self, project_id: &ProjectId) -> DataDescriptor {
        let details = self.data.details;
        DataDescriptor {
            project_id: project_id.clone(),
            data_id: DataId::new(self.data.id),
            path: details.path,
            name: details.name,
            data_type: details.data_type,
            file_size_in_bytes: details.file_size_in_bytes,
            object_tag: details
                .object_etag
                .filter(|tag| !tag.is_empty())
                .map(ObjectTag::new),
            status: details.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDataBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder_id: Option<&'a str>,
    data_type: &'static str,
}

#[derive(Deserialize)]
struct UrlResponse {
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemporaryCredentialsResponse {
    aws_temp_credentials: AwsTempCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AwsTempCredentials {
    access_key: String,
    secret_key: String,
    session_token: String,
    region: String,
    bucket: String,
    object_prefix: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CopyBatchBody<'a> {
    items: Vec<CopyBatchItem<'a>>,
    destination_folder_id: &'a str,
    copy_user_tags: bool,
    copy_technical_tags: bool,
    copy_instrument_info: bool,
    action_on_exist: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CopyBatchItem<'a> {
    data_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CopyBatchResponse {
    job: JobRef,
}

#[derive(Debug, Deserialize)]
struct JobRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    id: String,
    status: CopyJobStatus,
}

#[async_trait]
impl DataStore for IcaDataStore {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    async fn get_by_id(
        &self,
        project_id: &ProjectId,
        data_id: &DataId,
    ) -> AppResult<DataDescriptor> {
        let url = format!(
            "/projects/{}/data/{}",
            encode(project_id.as_str()),
            encode(data_id.as_str())
        );
        let item: ProjectDataItem = self.send_json(self.get(&url), "data object").await?;
        Ok(item.into_descriptor(project_id))
    }

    async fn find_by_path(
        &self,
        project_id: &ProjectId,
        path: &str,
        data_type: DataType,
    ) -> AppResult<Vec<DataDescriptor>> {
        let query = format!(
            "filePath={}&filePathMatchMode=FULL_CASE_INSENSITIVE&type={}",
            encode(path),
            data_type_param(data_type)
        );
        self.list_all(project_id, &query).await
    }

    async fn list_children(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
    ) -> AppResult<Vec<DataDescriptor>> {
        let query = format!("parentFolderId={}", encode(folder_id.as_str()));
        self.list_all(project_id, &query).await
    }

    async fn delete(&self, project_id: &ProjectId, data_id: &DataId) -> AppResult<()> {
        let url = format!(
            "/projects/{}/data/{}:delete",
            encode(project_id.as_str()),
            encode(data_id.as_str())
        );
        send(self.post(&url), "data deletion").await?;
        tracing::debug!(project_id = %project_id, data_id = %data_id, "Deleted data object");
        Ok(())
    }

    async fn create_folder(
        &self,
        project_id: &ProjectId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<DataDescriptor> {
        let url = format!("/projects/{}/data", encode(project_id.as_str()));
        let body = CreateDataBody {
            name,
            folder_path: Some(parent_path),
            folder_id: None,
            data_type: "FOLDER",
        };
        let item: ProjectDataItem = self
            .send_json(self.post(&url).json(&body), "folder creation")
            .await?;
        Ok(item.into_descriptor(project_id))
    }

    async fn create_file_with_upload_url(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
        name: &str,
    ) -> AppResult<UploadTarget> {
        let url = format!("/projects/{}/data", encode(project_id.as_str()));
        let body = CreateDataBody {
            name,
            folder_path: None,
            folder_id: Some(folder_id.as_str()),
            data_type: "FILE",
        };
        let item: ProjectDataItem = self
            .send_json(self.post(&url).json(&body), "file creation")
            .await?;
        let data_id = DataId::new(item.data.id);

        let url = format!(
            "/projects/{}/data/{}:createUploadUrl",
            encode(project_id.as_str()),
            encode(data_id.as_str())
        );
        let upload: UrlResponse = self
            .send_json(self.post(&url).json(&serde_json::json!({})), "upload url")
            .await?;

        Ok(UploadTarget {
            data_id,
            url: PresignedUrl::new(upload.url),
        })
    }

    async fn create_download_url(
        &self,
        project_id: &ProjectId,
        data_id: &DataId,
    ) -> AppResult<PresignedUrl> {
        let url = format!(
            "/projects/{}/data/{}:createDownloadUrl",
            encode(project_id.as_str()),
            encode(data_id.as_str())
        );
        let download: UrlResponse = self.send_json(self.post(&url), "download url").await?;
        Ok(PresignedUrl::new(download.url))
    }

    async fn folder_credentials(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
    ) -> AppResult<ScopedCredentials> {
        let url = format!(
            "/projects/{}/data/{}:createTemporaryCredentials",
            encode(project_id.as_str()),
            encode(folder_id.as_str())
        );
        let response: TemporaryCredentialsResponse = self
            .send_json(
                self.post(&url).json(&serde_json::json!({})),
                "temporary credentials",
            )
            .await?;
        let creds = response.aws_temp_credentials;
        Ok(ScopedCredentials {
            access_key: creds.access_key,
            secret_key: creds.secret_key,
            session_token: creds.session_token,
            region: creds.region,
            bucket: creds.bucket,
            object_prefix: creds.object_prefix.trim_end_matches('/').to_string(),
        })
    }

    async fn submit_copy_batch(&self, request: &CopyBatchRequest) -> AppResult<JobId> {
        let folders = self
            .find_by_path(
                &request.destination_project_id,
                &request.destination_folder_path,
                DataType::Folder,
            )
            .await?;
        let folder = folders
            .into_iter()
            .find(|f| f.path == request.destination_folder_path)
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Destination folder {} not found",
                    request.destination_folder_path
                ))
            })?;

        let url = format!(
            "/projects/{}/dataCopyBatch",
            encode(request.destination_project_id.as_str())
        );
        let body = CopyBatchBody {
            items: request
                .source_data_ids
                .iter()
                .map(|id| CopyBatchItem { data_id: id.as_str() })
                .collect(),
            destination_folder_id: folder.data_id.as_str(),
            copy_user_tags: true,
            copy_technical_tags: true,
            copy_instrument_info: true,
            action_on_exist: "SKIP",
        };
        let response: CopyBatchResponse = self
            .send_json(self.post(&url).json(&body), "copy batch submission")
            .await?;
        Ok(JobId::new(response.job.id))
    }

    async fn job_status(&self, job_id: &JobId) -> AppResult<CopyJobDescriptor> {
        let url = format!("/jobs/{}", encode(job_id.as_str()));
        let job: JobResponse = self.send_json(self.get(&url), "job").await?;
        Ok(CopyJobDescriptor {
            job_id: JobId::new(job.id),
            status: job.status,
        })
    }
}
