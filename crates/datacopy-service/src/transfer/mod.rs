//! Single-object transfers: strategy selection, the idempotent-upload
//! contract, and uploads from external buckets.

pub mod external;
pub mod selector;
pub mod service;

pub use external::ExternalTransferService;
pub use selector::{SourceOrigin, TransferIntent, select};
pub use service::{DestinationState, TransferService};
