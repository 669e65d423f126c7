//! Data object domain entities.

pub mod descriptor;
pub mod partition;
pub mod status;
pub mod tag;

pub use descriptor::{DataDescriptor, DataRef, DataType};
pub use partition::PartStructurePartition;
pub use status::DataStatus;
pub use tag::{ObjectTag, PartStructure};
