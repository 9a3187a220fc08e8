// src/error.rs

//! Unified error handling for the relay.
//!
//! Upstream failures (bad status, timeouts, malformed bodies) are normally
//! absorbed by the clients and turned into tagged results. An `AppError`
//! reaching the pipeline boundary is an unexpected fault.

use std::fmt;

use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream endpoint answered with a non-success status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Upstream {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Upstream body did not have the expected shape
    #[error("Unexpected payload from {endpoint}: {message}")]
    Payload { endpoint: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an upstream status error.
    pub fn upstream(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a payload shape error.
    pub fn payload(endpoint: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Payload {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message() {
        let err = AppError::upstream("transfer", 500, "boom");
        assert_eq!(err.to_string(), "transfer returned HTTP 500: boom");
    }

    #[test]
    fn test_payload_message() {
        let err = AppError::payload("media", "missing `data` object");
        assert_eq!(
            err.to_string(),
            "Unexpected payload from media: missing `data` object"
        );
    }
}
