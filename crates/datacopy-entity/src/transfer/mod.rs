//! Single-object transfer entities.

pub mod outcome;
pub mod plan;

pub use outcome::{TransferOutcome, TransferReport};
pub use plan::{PresignedUrl, TransferLocator, TransferPlan, TransferStrategy};
