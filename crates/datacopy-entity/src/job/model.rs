//! Batch copy job requests and descriptors.

use datacopy_core::types::{DataId, JobId, ProjectId};
use serde::{Deserialize, Serialize};

use super::status::CopyJobStatus;

/// Request body for one batch copy submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyBatchRequest {
    /// Objects to copy. Folders are copied recursively by the service.
    pub source_data_ids: Vec<DataId>,
    /// Project that receives the copies.
    pub destination_project_id: ProjectId,
    /// Absolute folder path in the destination project, ending with `/`.
    pub destination_folder_path: String,
}

/// A batch copy job as reported by the storage service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyJobDescriptor {
    /// Job identifier.
    pub job_id: JobId,
    /// Current provider status.
    pub status: CopyJobStatus,
}

/// Outcome of a submission: the identifier of the new job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSubmission {
    /// Identifier of the submitted job.
    pub job_id: JobId,
}
