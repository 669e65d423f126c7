//! Rename and external-source entities.

use datacopy_core::types::{DataId, DataUri, ProjectId};
use serde::{Deserialize, Serialize};

/// Inputs for locating a copied object that should be renamed.
///
/// `source_uri_list`, `external_source_uri_list` and `destination_uri` are
/// those of the original copy request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameMappingRequest {
    /// Storage service sources of the original copy.
    pub source_uri_list: Vec<DataUri>,
    /// External (`s3://`) sources of the original copy.
    #[serde(default)]
    pub external_source_uri_list: Vec<String>,
    /// Destination folder of the original copy.
    pub destination_uri: DataUri,
    /// Identifier of the original (pre-copy) object.
    #[serde(default)]
    pub data_id: Option<DataId>,
    /// Locator of the original object, storage service or external.
    #[serde(default)]
    pub input_file_uri: Option<String>,
    /// New name for the copied object. Must not contain path components.
    pub output_file_name: String,
}

/// Parameters identifying a copied object and the name it should end up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameMapping {
    /// Project holding the copied object.
    pub project_id: ProjectId,
    /// The copied object, under its original name.
    pub input_data_id: DataId,
    /// Where the object should live after renaming.
    pub output_data_uri: DataUri,
    /// Size of the copied object.
    pub file_size_in_bytes: u64,
}

/// Size and shape of an object in an external S3 bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSourceMetadata {
    /// Object size.
    pub source_file_size_in_bytes: u64,
    /// Whether the object was written by a multipart upload.
    pub is_multipart_file: bool,
}
