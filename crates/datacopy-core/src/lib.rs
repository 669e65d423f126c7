//! # datacopy-core
//!
//! Core crate for DataCopy. Contains configuration schemas, typed
//! identifiers and locators, scoped transfer credentials, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other DataCopy crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
