//! Shared primitives for all Rust crates in Snapsweep.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Snapsweep crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
///
/// Listing-path failures (`Transport`, `Upstream`, `Deserialization`) abort a
/// cleanup run when they surface from a collection read. Per-snapshot delete
/// failures never become errors; adapters convert them to a negative result.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid configuration value. Raised before any network
    /// or email activity that depends on the value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network-level failure reaching an upstream API.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream API answered with a non-success status code.
    #[error("upstream returned status {status}: {message}")]
    Upstream {
        /// HTTP status code returned by the upstream API.
        status: u16,
        /// Response body, or a placeholder when it could not be read.
        message: String,
    },

    /// Response body was absent or did not decode into the expected shape.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// The notification email could not be delivered.
    #[error("email delivery error: {0}")]
    Delivery(String),

    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn upstream_error_includes_status_code() {
        let error = AppError::Upstream {
            status: 503,
            message: "unavailable".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "upstream returned status 503: unavailable"
        );
    }

    #[test]
    fn configuration_error_formats_message() {
        let error = AppError::Configuration("REPORT_TO_ADDRESS is required".to_owned());
        assert!(error.to_string().contains("REPORT_TO_ADDRESS"));
    }
}
