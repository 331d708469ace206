//! Error handling for the Pixelbin client
//!
//! This module defines the error types used throughout the library and the
//! classification used by the retry machinery to tell transient failures from
//! fatal ones.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PixelbinError>;

/// Error types that can occur when using the Pixelbin client
#[derive(Error, Debug)]
pub enum PixelbinError {
    /// Malformed CDN URL, version tag or pattern shape
    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    /// A local precondition failed (missing field, out-of-range option, double signing)
    #[error("Illegal argument: {message}")]
    IllegalArgument { message: String },

    /// A reserved query parameter (`dpr`, `f_auto`) is outside its domain
    #[error("Illegal query parameter: {message}")]
    IllegalQueryParameter { message: String },

    /// Structured input rejected before any network call
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    /// The platform answered with an error response
    #[error("Server response error: {message}")]
    ServerResponse {
        message: String,
        status: Option<u16>,
        code: Option<String>,
        details: Option<serde_json::Value>,
    },

    /// A prediction job did not reach a terminal state
    #[error("Prediction {request_id} is still pending (status: {status})")]
    JobPending { request_id: String, status: String },

    /// Connection-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL could not be parsed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl PixelbinError {
    /// Create a new invalid URL error
    pub fn invalid_url(message: impl Into<String>) -> Self {
        PixelbinError::InvalidUrl {
            message: message.into(),
        }
    }

    /// Create a new illegal argument error
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        PixelbinError::IllegalArgument {
            message: message.into(),
        }
    }

    /// Create a new illegal query parameter error
    pub fn illegal_query_parameter(message: impl Into<String>) -> Self {
        PixelbinError::IllegalQueryParameter {
            message: message.into(),
        }
    }

    /// Create a new validation error with a single detail line
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        PixelbinError::Validation {
            details: vec![message.clone()],
            message,
        }
    }

    /// Create a new server response error
    pub fn server_response(
        message: impl Into<String>,
        status: Option<u16>,
        code: Option<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        PixelbinError::ServerResponse {
            message: message.into(),
            status,
            code,
            details,
        }
    }

    /// Create a new pending-job error
    pub fn job_pending(request_id: impl Into<String>, status: impl Into<String>) -> Self {
        PixelbinError::JobPending {
            request_id: request_id.into(),
            status: status.into(),
        }
    }

    /// HTTP status carried by a server response error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            PixelbinError::ServerResponse { status, .. } => *status,
            PixelbinError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for upstream responses with a status in `[400, 500)`.
    ///
    /// These are never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PixelbinError::ServerResponse {
                status: Some(400..=499),
                ..
            }
        )
    }
}
