//! Error types for the form API client.
//!
//! # Design
//! Failures are split by where they were detected: the dispatcher
//! (`MissingMethod`), the transport (`Timeout`, `Request`), the HTTP status
//! line (`ClientError`, `ServerError`), or the response body (`Request` with
//! the raw body as its message). None of them are retried internally.

use thiserror::Error;

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The dispatched call name does not resolve to a capability.
    #[error("call to undefined method {type_name}::{name}()")]
    MissingMethod {
        /// The name as the caller supplied it, before transformation.
        name: String,
        /// Type name of the client the call was made against.
        type_name: String,
    },

    /// Connect or read timeout exceeded.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Transport failure, or a response body that is neither a recognized
    /// JSON result nor an allowed plain-string response.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a 4xx status.
    #[error("client error (HTTP {status}): {body}")]
    ClientError { status: u16, body: String },

    /// The server answered with a 5xx status.
    #[error("server error (HTTP {status}): {body}")]
    ServerError { status: u16, body: String },

    /// The client could not be configured (missing URL or credentials).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Returns `true` for failures a caller may reasonably retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ServerError { .. })
    }

    /// HTTP status attached to the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ClientError { status, .. } | Self::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_server_errors_are_retryable() {
        assert!(ApiError::Timeout("connect".to_string()).is_retryable());
        let err = ApiError::ServerError {
            status: 503,
            body: "maintenance".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn client_and_request_errors_are_not_retryable() {
        let err = ApiError::ClientError {
            status: 404,
            body: String::new(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(404));
        assert!(!ApiError::Request("garbage".to_string()).is_retryable());
        assert_eq!(ApiError::Request("garbage".to_string()).status(), None);
    }

    #[test]
    fn missing_method_names_type_and_call() {
        let err = ApiError::MissingMethod {
            name: "contact_frobnicate".to_string(),
            type_name: "ApiClient".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "call to undefined method ApiClient::contact_frobnicate()"
        );
    }
}
