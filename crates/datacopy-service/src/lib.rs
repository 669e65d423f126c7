//! # datacopy-service
//!
//! Orchestration layer for DataCopy. Each service is a thin struct holding
//! `Arc` handles to the storage seams; nothing here keeps state between
//! invocations.

pub mod classify;
pub mod context;
pub mod copy;
pub mod rename;
pub mod resolver;
pub mod transfer;

pub use context::ServiceContext;
