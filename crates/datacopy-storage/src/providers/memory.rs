//! In-memory [`DataStore`] used by unit and integration tests.
//!
//! Objects live in a single map keyed by `(projectId, dataId)`. Project
//! root folders are created on first use. Folder credentials point at a
//! fake bucket whose object keys are `{projectId}{path}`, so server-side
//! moves and direct bucket uploads can be applied back onto the map.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use datacopy_core::error::AppError;
use datacopy_core::result::AppResult;
use datacopy_core::types::{DataId, JobId, ProjectId, S3Uri, ScopedCredentials};
use datacopy_entity::data::{DataDescriptor, DataStatus, DataType, ObjectTag};
use datacopy_entity::job::{CopyBatchRequest, CopyJobDescriptor, CopyJobStatus};
use datacopy_entity::transfer::PresignedUrl;

use crate::store::{DataStore, UploadTarget};

/// Bucket name reported by [`MemoryDataStore::folder_credentials`].
pub const MEMORY_BUCKET: &str = "memory-bucket";

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<(ProjectId, DataId), DataDescriptor>,
    next_id: u64,
    jobs: HashMap<JobId, CopyJobStatus>,
    submissions: Vec<CopyBatchRequest>,
    deleted: Vec<DataId>,
    failing_deletes: HashSet<DataId>,
    uploads: HashMap<String, (ProjectId, DataId)>,
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> DataId {
        self.next_id += 1;
        DataId::new(format!("{prefix}.{:06}", self.next_id))
    }

    fn by_path(&self, project_id: &ProjectId, path: &str) -> Option<DataDescriptor> {
        self.objects
            .values()
            .find(|d| &d.project_id == project_id && d.path == path)
            .cloned()
    }

    fn ensure_folder(&mut self, project_id: &ProjectId, path: &str) -> DataDescriptor {
        let path = if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };
        if let Some(existing) = self.by_path(project_id, &path) {
            return existing;
        }
        let trimmed = path.trim_end_matches('/');
        if !trimmed.is_empty() {
            let parent = &trimmed[..=trimmed.rfind('/').unwrap_or(0)];
            self.ensure_folder(project_id, parent);
        }
        let name = trimmed.rsplit('/').next().unwrap_or_default().to_string();
        let data_id = self.next_id("fol");
        let folder = DataDescriptor {
            project_id: project_id.clone(),
            data_id: data_id.clone(),
            path,
            name,
            data_type: DataType::Folder,
            file_size_in_bytes: None,
            object_tag: None,
            status: DataStatus::Available,
        };
        self.objects
            .insert((project_id.clone(), data_id), folder.clone());
        folder
    }

    fn insert_file(
        &mut self,
        project_id: &ProjectId,
        path: &str,
        size: Option<u64>,
        tag: Option<ObjectTag>,
        status: DataStatus,
    ) -> DataDescriptor {
        let parent = &path[..=path.rfind('/').unwrap_or(0)];
        self.ensure_folder(project_id, parent);
        if let Some(existing) = self.by_path(project_id, path) {
            self.objects
                .remove(&(project_id.clone(), existing.data_id.clone()));
        }
        let data_id = self.next_id("fil");
        let file = DataDescriptor {
            project_id: project_id.clone(),
            data_id: data_id.clone(),
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or_default().to_string(),
            data_type: DataType::File,
            file_size_in_bytes: size,
            object_tag: tag,
            status,
        };
        self.objects.insert((project_id.clone(), data_id), file.clone());
        file
    }
}

/// In-memory storage service.
#[derive(Debug)]
pub struct MemoryDataStore {
    scheme: String,
    state: Mutex<MemoryState>,
}

impl Default for MemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDataStore {
    /// Empty store using the `icav2` scheme.
    pub fn new() -> Self {
        Self {
            scheme: "icav2".to_string(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a folder (and any missing parents). `path` should end with `/`.
    pub fn add_folder(&self, project_id: &str, path: &str) -> DataDescriptor {
        self.state().ensure_folder(&ProjectId::new(project_id), path)
    }

    /// Create an AVAILABLE file, replacing anything at the same path.
    pub fn add_file(
        &self,
        project_id: &str,
        path: &str,
        size: u64,
        tag: Option<&str>,
    ) -> DataDescriptor {
        self.state().insert_file(
            &ProjectId::new(project_id),
            path,
            Some(size),
            tag.map(ObjectTag::new),
            DataStatus::Available,
        )
    }

    /// Create a PARTIAL file, as left behind by an interrupted upload.
    pub fn add_partial_file(&self, project_id: &str, path: &str) -> DataDescriptor {
        self.state().insert_file(
            &ProjectId::new(project_id),
            path,
            None,
            None,
            DataStatus::Partial,
        )
    }

    /// Look an object up by exact path.
    pub fn find(&self, project_id: &str, path: &str) -> Option<DataDescriptor> {
        self.state().by_path(&ProjectId::new(project_id), path)
    }

    /// Set the provider status reported for a job.
    pub fn set_job_status(&self, job_id: &JobId, status: CopyJobStatus) {
        self.state().jobs.insert(job_id.clone(), status);
    }

    /// Every batch copy submitted so far, oldest first.
    pub fn submissions(&self) -> Vec<CopyBatchRequest> {
        self.state().submissions.clone()
    }

    /// Identifiers of every deleted object, in deletion order.
    pub fn deleted(&self) -> Vec<DataId> {
        self.state().deleted.clone()
    }

    /// Make every later delete of `data_id` fail.
    pub fn fail_deletes_of(&self, data_id: &DataId) {
        self.state().failing_deletes.insert(data_id.clone());
    }

    /// Allow deletes of `data_id` again.
    pub fn allow_deletes_of(&self, data_id: &DataId) {
        self.state().failing_deletes.remove(data_id);
    }

    /// Finish an upload started with `create_file_with_upload_url`.
    ///
    /// Returns `false` if the URL was not issued by this store.
    pub fn complete_upload(&self, url: &PresignedUrl, size: u64) -> bool {
        let mut state = self.state();
        let Some(key) = state.uploads.remove(url.expose()) else {
            return false;
        };
        match state.objects.get_mut(&key) {
            Some(file) => {
                file.file_size_in_bytes = Some(size);
                file.object_tag = Some(ObjectTag::new(format!("memtag{}", key.1)));
                file.status = DataStatus::Available;
                true
            }
            None => false,
        }
    }

    /// Apply a server-side move between two keys of the fake bucket.
    pub fn move_object(&self, source: &S3Uri, destination: &S3Uri) -> bool {
        self.transfer_object(source, destination, true)
    }

    /// Apply a server-side copy between two keys, keeping the source.
    pub fn copy_object(&self, source: &S3Uri, destination: &S3Uri) -> bool {
        self.transfer_object(source, destination, false)
    }

    fn transfer_object(&self, source: &S3Uri, destination: &S3Uri, remove_source: bool) -> bool {
        let (Some((src_project, src_path)), Some((dst_project, dst_path))) =
            (split_key(source), split_key(destination))
        else {
            return false;
        };
        let mut state = self.state();
        let Some(existing) = state.by_path(&src_project, &src_path) else {
            return false;
        };
        if remove_source {
            state
                .objects
                .remove(&(src_project.clone(), existing.data_id.clone()));
        }
        state.insert_file(
            &dst_project,
            &dst_path,
            existing.file_size_in_bytes,
            existing.object_tag,
            DataStatus::Available,
        );
        true
    }

    /// Store an object written directly into the fake bucket.
    pub fn put_object(&self, destination: &S3Uri, size: u64, parts: u32) -> bool {
        let Some((project, path)) = split_key(destination) else {
            return false;
        };
        self.state().insert_file(
            &project,
            &path,
            Some(size),
            Some(ObjectTag::new(format!("memtag-{parts}"))),
            DataStatus::Available,
        );
        true
    }
}

fn split_key(uri: &S3Uri) -> Option<(ProjectId, String)> {
    if uri.bucket != MEMORY_BUCKET {
        return None;
    }
    let (project, path) = uri.key.split_once('/')?;
    Some((ProjectId::new(project), format!("/{path}")))
}

fn download_url(project_id: &ProjectId, data_id: &DataId) -> String {
    format!("memory://download/{project_id}/{data_id}")
}

#[async_trait]
impl DataStore for MemoryDataStore {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    async fn get_by_id(
        &self,
        project_id: &ProjectId,
        data_id: &DataId,
    ) -> AppResult<DataDescriptor> {
        self.state()
            .objects
            .get(&(project_id.clone(), data_id.clone()))
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No object {data_id} in {project_id}")))
    }

    async fn find_by_path(
        &self,
        project_id: &ProjectId,
        path: &str,
        data_type: DataType,
    ) -> AppResult<Vec<DataDescriptor>> {
        let mut state = self.state();
        if path == "/" {
            return Ok(vec![state.ensure_folder(project_id, "/")]);
        }
        Ok(state
            .objects
            .values()
            .filter(|d| {
                &d.project_id == project_id
                    && d.data_type == data_type
                    && d.path.eq_ignore_ascii_case(path)
            })
            .cloned()
            .collect())
    }

    async fn list_children(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
    ) -> AppResult<Vec<DataDescriptor>> {
        let state = self.state();
        let folder = state
            .objects
            .get(&(project_id.clone(), folder_id.clone()))
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No folder {folder_id}")))?;
        Ok(state
            .objects
            .values()
            .filter(|d| {
                &d.project_id == project_id
                    && d.data_id != folder.data_id
                    && d.path
                        .trim_end_matches('/')
                        .strip_prefix(folder.path.as_str())
                        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .cloned()
            .collect())
    }

    async fn delete(&self, project_id: &ProjectId, data_id: &DataId) -> AppResult<()> {
        let mut state = self.state();
        if state.failing_deletes.contains(data_id) {
            return Err(AppError::external_service(format!(
                "Deletion of {data_id} rejected"
            )));
        }
        state
            .objects
            .remove(&(project_id.clone(), data_id.clone()))
            .ok_or_else(|| AppError::not_found(format!("No object {data_id}")))?;
        state.deleted.push(data_id.clone());
        Ok(())
    }

    async fn create_folder(
        &self,
        project_id: &ProjectId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<DataDescriptor> {
        let mut state = self.state();
        if state.by_path(project_id, parent_path).is_none() && parent_path != "/" {
            return Err(AppError::not_found(format!(
                "Parent folder {parent_path} does not exist"
            )));
        }
        Ok(state.ensure_folder(project_id, &format!("{parent_path}{name}/")))
    }

    async fn create_file_with_upload_url(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
        name: &str,
    ) -> AppResult<UploadTarget> {
        let mut state = self.state();
        let folder = state
            .objects
            .get(&(project_id.clone(), folder_id.clone()))
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No folder {folder_id}")))?;
        let path = format!("{}{name}", folder.path);
        if state.by_path(project_id, &path).is_some() {
            return Err(AppError::external_service(format!("{path} already exists")));
        }
        let file = state.insert_file(project_id, &path, None, None, DataStatus::Partial);
        let url = format!("memory://upload/{project_id}/{}", file.data_id);
        state
            .uploads
            .insert(url.clone(), (project_id.clone(), file.data_id.clone()));
        Ok(UploadTarget {
            data_id: file.data_id,
            url: PresignedUrl::new(url),
        })
    }

    async fn create_download_url(
        &self,
        project_id: &ProjectId,
        data_id: &DataId,
    ) -> AppResult<PresignedUrl> {
        self.get_by_id(project_id, data_id).await?;
        Ok(PresignedUrl::new(download_url(project_id, data_id)))
    }

    async fn folder_credentials(
        &self,
        project_id: &ProjectId,
        folder_id: &DataId,
    ) -> AppResult<ScopedCredentials> {
        let folder = self.get_by_id(project_id, folder_id).await?;
        Ok(ScopedCredentials {
            access_key: "memory-access".to_string(),
            secret_key: "memory-secret".to_string(),
            session_token: "memory-session".to_string(),
            region: "us-east-1".to_string(),
            bucket: MEMORY_BUCKET.to_string(),
            object_prefix: format!("{project_id}{}", folder.path.trim_end_matches('/')),
        })
    }

    async fn submit_copy_batch(&self, request: &CopyBatchRequest) -> AppResult<JobId> {
        let mut state = self.state();
        let job_id = JobId::new(format!("job-{}", state.submissions.len() + 1));
        state.submissions.push(request.clone());
        state
            .jobs
            .insert(job_id.clone(), CopyJobStatus::Initialized);
        Ok(job_id)
    }

    async fn job_status(&self, job_id: &JobId) -> AppResult<CopyJobDescriptor> {
        let status = self
            .state()
            .jobs
            .get(job_id)
            .copied()
            .ok_or_else(|| AppError::not_found(format!("No job {job_id}")))?;
        Ok(CopyJobDescriptor {
            job_id: job_id.clone(),
            status,
        })
    }
}
