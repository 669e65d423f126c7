//! Remote storage service trait.

use async_trait::async_trait;

use datacopy_core::result::AppResult;
use datacopy_core::types::{DataId, JobId, ProjectId, ScopedCredentials};
use datacopy_entity::data::{DataDescriptor, DataType};
use datacopy_entity::job::{CopyBatchRequest, CopyJobDescriptor};
use datacopy_entity::transfer::PresignedUrl;

/// A freshly created, still empty file and the URL that fills it.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    /// Identifier of the created file.
    pub data_id: DataId,
    /// Time-limited PUT URL.
    pub url: PresignedUrl,
}

/// Operations the orchestration layer needs from the storage service.
///
/// Lookups that miss return an error with kind `NotFound`.
#[async_trait]
pub trait DataStore: Send + Sync + std::fmt::Debug + 'static {
    /// URI scheme used for this service's locators.
    fn scheme(&self) -> &str;

    /// Fetch one object by identifier.
    async fn get_by_id(&self, project_id: &ProjectId, data_id: &DataId)
    -> AppResult<DataDescriptor>;

    /// Every object of the given type whose path matches `path`.
    ///
    /// Folder paths are passed with a trailing `/`. May return more than
    /// one entry; callers decide whether that is ambiguous.
    async fn find_by_path(
        &self,
        project_id: &ProjectId,
        path: &str,
        data_type: DataType,
    ) -> AppResult<Vec<DataDescriptor>>;

    /// Immediate children of a folder, across all pages.
    async fn list_children(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
    ) -> AppResult<Vec<DataDescriptor>>;

    /// Delete an object.
    async fn delete(&self, project_id: &ProjectId, data_id: &DataId) -> AppResult<()>;

    /// Create folder `name` inside the folder at `parent_path`.
    async fn create_folder(
        &self,
        project_id: &ProjectId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<DataDescriptor>;

    /// Create an empty file in a folder and return a URL to upload its content.
    async fn create_file_with_upload_url(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
        name: &str,
    ) -> AppResult<UploadTarget>;

    /// Time-limited GET URL for a file.
    async fn create_download_url(
        &self,
        project_id: &ProjectId,
        data_id: &DataId,
    ) -> AppResult<PresignedUrl>;

    /// Temporary S3 credentials scoped to a folder.
    async fn folder_credentials(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
    ) -> AppResult<ScopedCredentials>;

    /// Submit an asynchronous batch copy and return the new job id.
    async fn submit_copy_batch(&self, request: &CopyBatchRequest) -> AppResult<JobId>;

    /// Current state of a batch copy job.
    async fn job_status(&self, job_id: &JobId) -> AppResult<CopyJobDescriptor>;
}
