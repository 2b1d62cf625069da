//! Error types for dynzone
//!
//! This module defines all error types used throughout the crate.
//!
//! "Zone not found" and "record not found" are engine outcomes, not errors.

use thiserror::Error;

/// Result type alias for dynzone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dynzone
#[derive(Error, Debug)]
pub enum Error {
    /// A request exceeded its timeout
    #[error("Request timed out: {url}")]
    Timeout {
        /// Target URL
        url: String,
    },

    /// Transport failure, non-2xx status or an unsuccessful API envelope
    #[error("Request failed: {url}: {message}")]
    Request {
        /// Target URL
        url: String,
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// A successful response whose body could not be decoded
    #[error("Invalid response from {url}: {message}")]
    InvalidResponse {
        /// Target URL
        url: String,
        /// Error message
        message: String,
    },

    /// Cache persistence errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IP discovery errors
    #[error("IP source error: {0}")]
    IpSource(String),
}

impl Error {
    /// Create a timeout error
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Create a request failure without an HTTP status (transport error)
    pub fn request(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create a request failure for a non-2xx status
    pub fn status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Whether this error came from talking to a remote endpoint
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Request { .. } | Self::InvalidResponse { .. }
        )
    }

    /// Whether this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// HTTP status carried by a request failure, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }
}
