//! Locators for objects in the remote storage service and in S3.
//!
//! A [`DataUri`] has the form `{scheme}://{projectId}{/absolute/path}`; a
//! trailing `/` on the path means the locator names a folder. An [`S3Uri`]
//! has the form `s3://{bucket}/{key}`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{DataId, ProjectId};
use crate::error::AppError;

/// A project-scoped locator into the remote storage service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri {
    /// URI scheme, e.g. `icav2`.
    pub scheme: String,
    /// Owning project.
    pub project_id: ProjectId,
    /// Absolute path within the project; always starts with `/`.
    pub path: String,
}

impl DataUri {
    /// Build a locator from its parts, normalising the path to be absolute.
    pub fn new(scheme: impl Into<String>, project_id: ProjectId, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            scheme: scheme.into(),
            project_id,
            path,
        }
    }

    /// Parse `scheme://project/path`.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let (scheme, rest) = value
            .split_once("://")
            .ok_or_else(|| AppError::validation(format!("Missing scheme in URI '{value}'")))?;
        if scheme.is_empty() || scheme == "s3" {
            return Err(AppError::validation(format!(
                "'{value}' is not a storage service URI"
            )));
        }
        let (project, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        if project.is_empty() {
            return Err(AppError::validation(format!(
                "Missing project id in URI '{value}'"
            )));
        }
        if path.contains("//") {
            return Err(AppError::validation(format!(
                "Empty path component in URI '{value}'"
            )));
        }
        Ok(Self::new(scheme, ProjectId::new(project), path))
    }

    /// Whether the locator names a folder.
    pub fn is_folder(&self) -> bool {
        self.path.ends_with('/')
    }

    /// Last path component without any trailing `/`. Empty for the root.
    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// The folder containing this object, as a folder locator.
    pub fn parent(&self) -> Self {
        let trimmed = self.path.trim_end_matches('/');
        let parent = match trimmed.rfind('/') {
            Some(idx) => &trimmed[..=idx],
            None => "/",
        };
        Self::new(self.scheme.clone(), self.project_id.clone(), parent)
    }

    /// The same location viewed as a folder (trailing `/` ensured).
    pub fn as_folder(&self) -> Self {
        if self.is_folder() {
            return self.clone();
        }
        Self::new(
            self.scheme.clone(),
            self.project_id.clone(),
            format!("{}/", self.path),
        )
    }

    /// Append a file name below this folder.
    pub fn join_file(&self, name: &str) -> Self {
        let folder = self.as_folder();
        Self::new(
            self.scheme.clone(),
            self.project_id.clone(),
            format!("{}{}", folder.path, name.trim_matches('/')),
        )
    }

    /// Append a sub-folder below this folder.
    pub fn join_folder(&self, name: &str) -> Self {
        let folder = self.as_folder();
        Self::new(
            self.scheme.clone(),
            self.project_id.clone(),
            format!("{}{}/", folder.path, name.trim_matches('/')),
        )
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.project_id, self.path)
    }
}

impl FromStr for DataUri {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DataUri {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DataUri> for String {
    fn from(value: DataUri) -> Self {
        value.to_string()
    }
}

/// A bucket/key locator in S3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct S3Uri {
    /// Bucket name.
    pub bucket: String,
    /// Object key, without a leading `/`.
    pub key: String,
}

impl S3Uri {
    /// Build a locator from a bucket and key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into().trim_start_matches('/').to_string(),
        }
    }

    /// Parse `s3://bucket/key`.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let rest = value
            .strip_prefix("s3://")
            .ok_or_else(|| AppError::validation(format!("'{value}' is not an s3:// URI")))?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(AppError::validation(format!("Missing bucket in '{value}'")));
        }
        Ok(Self::new(bucket, key))
    }

    /// Last key component.
    pub fn name(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl FromStr for S3Uri {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for S3Uri {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<S3Uri> for String {
    fn from(value: S3Uri) -> Self {
        value.to_string()
    }
}

/// Either a path locator or an explicit `(projectId, dataId)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocator {
    /// Path-based lookup.
    Uri(DataUri),
    /// Identifier-based lookup.
    Id {
        /// Owning project.
        project_id: ProjectId,
        /// Object identifier.
        data_id: DataId,
    },
}

impl DataLocator {
    /// Identifier-based locator.
    pub fn id(project_id: ProjectId, data_id: DataId) -> Self {
        Self::Id {
            project_id,
            data_id,
        }
    }
}

impl From<DataUri> for DataLocator {
    fn from(value: DataUri) -> Self {
        Self::Uri(value)
    }
}

impl fmt::Display for DataLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(uri) => write!(f, "{uri}"),
            Self::Id {
                project_id,
                data_id,
            } => write!(f, "{project_id}/{data_id}"),
        }
    }
}
