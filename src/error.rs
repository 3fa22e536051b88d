//! Error handling for the upload client
//!
//! This module defines the error types used throughout the library and the
//! classification of Upload API responses into those errors.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, UploadError>;

/// Error code the Upload API uses to signal rate limiting
pub const THROTTLED_ERROR_CODE: &str = "RequestThrottledError";

/// Method and URL of the request that produced an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: String,
    pub url: String,
}

impl RequestSummary {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for RequestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A failure reported by the remote side
///
/// Carries the remote error code and content together with the offending
/// request and the raw response, so callers can inspect what went wrong
/// after the error has crossed any number of component boundaries.
#[derive(Debug, Clone)]
pub struct UploadClientError {
    /// Human readable error content from the remote
    pub content: String,
    /// Remote error code, e.g. `RequestThrottledError`
    pub error_code: Option<String>,
    /// HTTP status of the response
    pub status: Option<u16>,
    /// The request that failed
    pub request: RequestSummary,
    /// Decoded response body, if it was JSON
    pub response: Option<Value>,
    /// Response headers, lower-cased names
    pub headers: HashMap<String, String>,
}

impl UploadClientError {
    pub fn new(content: impl Into<String>, request: RequestSummary) -> Self {
        Self {
            content: content.into(),
            error_code: None,
            status: None,
            request,
            response: None,
            headers: HashMap::new(),
        }
    }

    pub fn error_code(mut self, code: Option<String>) -> Self {
        self.error_code = code;
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn response(mut self, response: Option<Value>) -> Self {
        self.response = response;
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Delay requested by the remote through the `Retry-After` header
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get("retry-after")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

impl fmt::Display for UploadClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_code {
            Some(code) => write!(f, "{} ({}) [{}]", self.content, code, self.request),
            None => write!(f, "{} [{}]", self.content, self.request),
        }
    }
}

/// Error types that can occur while uploading
#[derive(Error, Debug)]
pub enum UploadError {
    /// The remote asked us to slow down
    #[error("Request throttled: {0}")]
    Throttled(Box<UploadClientError>),

    /// The remote rejected the request
    #[error("Upload API error: {0}")]
    Client(Box<UploadClientError>),

    /// Invalid parameter supplied by the caller
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Operation was cancelled
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    /// The remote answered with something we cannot interpret
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Network level failure, no response was received
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Operation timed out
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UploadError {
    /// Create a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        UploadError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new cancelled error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        UploadError::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        UploadError::Transport {
            message: message.into(),
        }
    }

    /// Create a new invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        UploadError::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        UploadError::Config {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        UploadError::Timeout {
            operation: operation.into(),
        }
    }

    /// Wrap a remote failure, picking the throttled kind when the remote
    /// signalled rate limiting
    pub fn from_remote(error: UploadClientError) -> Self {
        let throttled = error.status == Some(429)
            || error.error_code.as_deref() == Some(THROTTLED_ERROR_CODE);

        if throttled {
            UploadError::Throttled(Box::new(error))
        } else {
            UploadError::Client(Box::new(error))
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, UploadError::Throttled(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Cancelled { .. })
    }

    /// Remote details, for throttled and client errors
    pub fn remote(&self) -> Option<&UploadClientError> {
        match self {
            UploadError::Throttled(e) | UploadError::Client(e) => Some(e),
            _ => None,
        }
    }

    /// Remote error code, for throttled and client errors
    pub fn error_code(&self) -> Option<&str> {
        self.remote().and_then(|e| e.error_code.as_deref())
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err.url().map(|url| url.to_string()).unwrap_or_default();
            return UploadError::timeout(format!("request to {}", url));
        }
        UploadError::transport(err.to_string())
    }
}
