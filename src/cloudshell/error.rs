//! Error types for the CloudShell backend.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the CloudShell backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CloudShellBackendError {
    /// Raised when the credentials or endpoint configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the request never produced an HTTP response.
    #[error("{operation} request failed: {message}")]
    Transport {
        /// API operation being called.
        operation: String,
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when the API answers with a non-success status.
    #[error("{operation} rejected with HTTP {status} ({kind}): {message}")]
    Api {
        /// API operation being called.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// AWS error type, or `unknown` when none was reported.
        kind: String,
        /// Error message reported by the API.
        message: String,
    },
    /// Raised when a response body cannot be decoded.
    #[error("failed to decode {operation} response: {message}")]
    Decode {
        /// API operation being called.
        operation: String,
        /// Decoder error message.
        message: String,
    },
}

impl From<ConfigError> for CloudShellBackendError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
