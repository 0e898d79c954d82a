//! Error presentation metadata
//!
//! Library crates define their own `thiserror` enums. This module provides the
//! shared trait those errors implement so callers (the CLI, a form handler)
//! can turn any failure into a stable code, a client-facing message and a log
//! level without matching on crate-specific variants.

use std::fmt::Display;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for bad input the caller can fix
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to a caller.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "INVALID_IMAGE")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Emit a tracing event for `err` at the level its metadata asks for.
pub fn log_error<E>(err: &E, context: &str)
where
    E: ErrorMetadata + Display + ?Sized,
{
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %err, code = err.error_code(), "{}", context)
        }
        LogLevel::Warn => {
            tracing::warn!(error = %err, code = err.error_code(), "{}", context)
        }
        LogLevel::Error => {
            tracing::error!(error = %err, code = err.error_code(), "{}", context)
        }
    }
}

/// Render an error together with its source chain, one cause per line.
pub fn detailed_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut details = err.to_string();

    let mut source = err.source();
    let mut depth = 0;
    while let Some(cause) = source {
        depth += 1;
        if depth > 5 {
            details.push_str("\n  ... (truncated)");
            break;
        }
        details.push_str(&format!("\n  Caused by: {}", cause));
        source = cause.source();
    }

    details
}
