//! Shared primitive types used across all DataCopy crates.

pub mod credentials;
pub mod id;
pub mod locator;

pub use credentials::ScopedCredentials;
pub use id::{DataId, JobId, ProjectId};
pub use locator::{DataLocator, DataUri, S3Uri};
