//! [`DataStore`](crate::store::DataStore) implementations.

pub mod ica;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use ica::IcaDataStore;
#[cfg(any(test, feature = "testing"))]
pub use memory::{MEMORY_BUCKET, MemoryDataStore};
