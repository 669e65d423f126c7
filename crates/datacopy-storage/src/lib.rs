//! # datacopy-storage
//!
//! Access to the project-scoped remote storage service and to S3. The
//! [`DataStore`] trait is the seam the orchestration services depend on;
//! the [`transfer`] module holds one [`TransferExecutor`] per transfer
//! strategy.

pub mod providers;
pub mod s3;
pub mod store;
pub mod transfer;

pub use store::{DataStore, UploadTarget};
pub use transfer::{TransferError, TransferExecutor, TransferExecutors};
