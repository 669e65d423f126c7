//! Convenience result type alias for DataCopy.

use crate::error::AppError;

/// A specialized `Result` type for DataCopy operations.
pub type AppResult<T> = Result<T, AppError>;
