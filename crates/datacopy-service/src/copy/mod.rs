//! Copy-set decomposition, partial-state reconciliation, and the batch copy
//! job lifecycle.

pub mod decomposer;
pub mod lifecycle;
pub mod reconciler;

pub use decomposer::CopySetDecomposer;
pub use lifecycle::CopyJobLifecycle;
pub use reconciler::PartialStateReconciler;
