//! Batch copy job domain entities.

pub mod model;
pub mod state;
pub mod status;

pub use model::{CopyBatchRequest, CopyJobDescriptor, JobSubmission};
pub use state::CopyJobState;
pub use status::{CopyJobStatus, JobSummary};
