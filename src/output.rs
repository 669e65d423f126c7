//! JSON output for task outcomes and failures.

use serde::Serialize;

use datacopy_core::error::AppError;

/// Failure shape written to stderr.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorOutput<'a> {
    /// Error kind, e.g. `DESTINATION_CONFLICT`.
    error_type: String,
    /// Human-readable message.
    message: &'a str,
}

/// Print a task outcome to stdout.
pub fn print_outcome<T: Serialize>(outcome: &T) -> Result<(), AppError> {
    let json = serde_json::to_string(outcome)?;
    println!("{json}");
    Ok(())
}

/// Print a failure to stderr.
pub fn print_error(error: &AppError) {
    let body = ErrorOutput {
        error_type: error.kind.to_string(),
        message: &error.message,
    };
    match serde_json::to_string(&body) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{}: {}", body.error_type, body.message),
    }
}
