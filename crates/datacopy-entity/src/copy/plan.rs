//! Decomposition of a copy request into a flat file list and folder sub-jobs.

use datacopy_core::types::DataUri;
use serde::{Deserialize, Serialize};

use crate::data::DataRef;

/// One folder to be copied by a later, separate job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecursiveCopyJob {
    /// Source folder, ending with `/`.
    pub source_uri: DataUri,
    /// Destination folder `{dest}/{folderName}/`.
    pub destination_uri: DataUri,
}

/// Result of decomposing a list of sources against one destination folder.
///
/// The flat list only ever holds files; each folder source is represented by
/// exactly one [`RecursiveCopyJob`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopySetPlan {
    /// File sources to copy directly into the destination.
    pub source_data_list: Vec<DataRef>,
    /// The resolved destination folder.
    pub destination_data: DataRef,
    /// Folder sources, one sub-job each.
    pub recursive_copy_jobs_uri_list: Vec<RecursiveCopyJob>,
}

impl CopySetPlan {
    /// Whether the plan has no work at this level.
    pub fn is_empty(&self) -> bool {
        self.source_data_list.is_empty() && self.recursive_copy_jobs_uri_list.is_empty()
    }
}
