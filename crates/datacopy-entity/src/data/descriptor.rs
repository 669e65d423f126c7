//! Data descriptor entity.

use datacopy_core::types::{DataId, DataLocator, DataUri, ProjectId};
use serde::{Deserialize, Serialize};

use super::status::DataStatus;
use super::tag::ObjectTag;

/// Kind of data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    /// A regular file.
    File,
    /// A folder.
    Folder,
}

/// Canonical snapshot of a file or folder in the remote storage service.
///
/// Immutable; re-fetch whenever freshness matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDescriptor {
    /// Owning project.
    pub project_id: ProjectId,
    /// Object identifier.
    pub data_id: DataId,
    /// Absolute path within the project. Folder paths end with `/`.
    pub path: String,
    /// Last path component.
    pub name: String,
    /// File or folder.
    pub data_type: DataType,
    /// Size in bytes; absent for folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_in_bytes: Option<u64>,
    /// Content tag; absent for folders and unwritten files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_tag: Option<ObjectTag>,
    /// Lifecycle status.
    pub status: DataStatus,
}

impl DataDescriptor {
    /// Whether this object is a folder.
    pub fn is_folder(&self) -> bool {
        self.data_type == DataType::Folder
    }

    /// Whether this object is a file.
    pub fn is_file(&self) -> bool {
        self.data_type == DataType::File
    }

    /// Whether this object is the residue of an incomplete write.
    pub fn is_partial(&self) -> bool {
        self.status.is_partial()
    }

    /// Whether the object was written by a multipart upload.
    ///
    /// Objects without a tag are treated as single-part.
    pub fn is_multi_part(&self) -> bool {
        self.object_tag
            .as_ref()
            .is_some_and(|tag| tag.is_multi_part())
    }

    /// Size in bytes, zero when unknown.
    pub fn size(&self) -> u64 {
        self.file_size_in_bytes.unwrap_or(0)
    }

    /// Locator of this object under the given scheme.
    pub fn uri(&self, scheme: &str) -> DataUri {
        DataUri::new(scheme, self.project_id.clone(), self.path.clone())
    }

    /// Identifier pair referencing this object.
    pub fn data_ref(&self) -> DataRef {
        DataRef {
            project_id: self.project_id.clone(),
            data_id: self.data_id.clone(),
        }
    }
}

/// A `(projectId, dataId)` reference to an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRef {
    /// Owning project.
    pub project_id: ProjectId,
    /// Object identifier.
    pub data_id: DataId,
}

impl DataRef {
    /// Build a reference from its parts.
    pub fn new(project_id: impl Into<ProjectId>, data_id: impl Into<DataId>) -> Self {
        Self {
            project_id: project_id.into(),
            data_id: data_id.into(),
        }
    }

    /// Identifier-based locator for this reference.
    pub fn locator(&self) -> DataLocator {
        DataLocator::id(self.project_id.clone(), self.data_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(tag: Option<&str>) -> DataDescriptor {
        DataDescriptor {
            project_id: ProjectId::new("proj"),
            data_id: DataId::new("fil.1"),
            path: "/in/a.bam".to_string(),
            name: "a.bam".to_string(),
            data_type: DataType::File,
            file_size_in_bytes: Some(42),
            object_tag: tag.map(ObjectTag::new),
            status: DataStatus::Available,
        }
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(file(Some("abc-2"))).unwrap();
        assert_eq!(json["projectId"], "proj");
        assert_eq!(json["dataId"], "fil.1");
        assert_eq!(json["dataType"], "FILE");
        assert_eq!(json["fileSizeInBytes"], 42);
        assert_eq!(json["objectTag"], "abc-2");
        assert_eq!(json["status"], "AVAILABLE");
    }

    #[test]
    fn test_missing_tag_is_single_part() {
        assert!(!file(None).is_multi_part());
        assert!(file(Some("abc-2")).is_multi_part());
    }

    #[test]
    fn test_uri() {
        assert_eq!(file(None).uri("icav2").to_string(), "icav2://proj/in/a.bam");
    }
}
