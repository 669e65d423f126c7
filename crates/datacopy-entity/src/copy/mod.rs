//! Copy-set planning entities.

pub mod plan;

pub use plan::{CopySetPlan, RecursiveCopyJob};
