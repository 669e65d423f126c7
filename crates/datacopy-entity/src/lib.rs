//! # datacopy-entity
//!
//! Domain models for DataCopy. Every struct in this crate is either a
//! snapshot of remote storage state (descriptors, job descriptors) or a
//! value object exchanged with the external caller (plans, job state,
//! outcomes). All wire shapes use camelCase field names.

pub mod copy;
pub mod data;
pub mod job;
pub mod rename;
pub mod transfer;
