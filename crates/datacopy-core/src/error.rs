//! Unified application error types for DataCopy.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] is what an
//! external caller branches on, so each kind has a stable wire name.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No object exists at the requested location.
    NotFound,
    /// A path lookup matched more than one object.
    AmbiguousPath,
    /// The destination locator is malformed (e.g. missing trailing `/`).
    InvalidDestination,
    /// An existing destination object has a different size than the source.
    DestinationConflict,
    /// The transfer operation failed; the message carries its diagnostics.
    ChildTransferFailure,
    /// A batch copy job kept failing past the maximum attempt count.
    JobRetriesExhausted,
    /// The copy succeeded but deleting the original object did not.
    RenameIncomplete,
    /// Input validation failed.
    Validation,
    /// A configuration error occurred.
    Configuration,
    /// The remote storage service returned an error or malformed response.
    ExternalService,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A storage I/O error occurred.
    Storage,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AmbiguousPath => write!(f, "AMBIGUOUS_PATH"),
            Self::InvalidDestination => write!(f, "INVALID_DESTINATION"),
            Self::DestinationConflict => write!(f, "DESTINATION_CONFLICT"),
            Self::ChildTransferFailure => write!(f, "CHILD_TRANSFER_FAILURE"),
            Self::JobRetriesExhausted => write!(f, "JOB_RETRIES_EXHAUSTED"),
            Self::RenameIncomplete => write!(f, "RENAME_INCOMPLETE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout DataCopy.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an ambiguous-path error.
    pub fn ambiguous_path(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AmbiguousPath, message)
    }

    /// Create an invalid-destination error.
    pub fn invalid_destination(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDestination, message)
    }

    /// Create a destination-conflict error.
    pub fn destination_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DestinationConflict, message)
    }

    /// Create a transfer failure error.
    pub fn child_transfer_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ChildTransferFailure, message)
    }

    /// Create a retries-exhausted error.
    pub fn job_retries_exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::JobRetriesExhausted, message)
    }

    /// Create a rename-incomplete error.
    pub fn rename_incomplete(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RenameIncomplete, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error is a resolution miss.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::destination_conflict("size mismatch");
        assert_eq!(err.to_string(), "DESTINATION_CONFLICT: size mismatch");
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err = AppError::with_source(ErrorKind::Storage, "write failed", io);
        let cloned = err.clone();
        assert!(cloned.source.is_none());
        assert_eq!(cloned.kind, ErrorKind::Storage);
    }

    #[test]
    fn test_is_not_found() {
        assert!(AppError::not_found("missing").is_not_found());
        assert!(!AppError::ambiguous_path("two").is_not_found());
    }
}
