//! Error types for metadata server operations.

use thiserror::Error;

/// Errors that can occur when querying the metadata server.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The process is not running on GCE and the client is in strict mode.
    #[error("not running on google compute engine")]
    NotOnGce,

    /// The metadata server answered 404 for the requested path.
    #[error("metadata path not found: {0}")]
    PathNotFound(String),

    /// Request timed out.
    #[error("request timeout")]
    Timeout,

    /// HTTP error with status code.
    #[error("http {0}")]
    Http(u16),

    /// Response was not valid UTF-8.
    #[error("invalid utf-8")]
    Utf8,

    /// JSON deserialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response exceeds maximum allowed size.
    #[error("response too large: {0} bytes exceeds limit of {1} bytes")]
    TooLarge(usize, usize),

    /// The client's transport has been released.
    #[error("metadata client is closed")]
    Closed,
}

impl MetadataError {
    /// Whether this error came from talking to the server rather than from
    /// client policy (`NotOnGce`, `Closed`) or a missing key (`PathNotFound`).
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            MetadataError::Timeout
                | MetadataError::Http(_)
                | MetadataError::Utf8
                | MetadataError::Json(_)
                | MetadataError::Request(_)
                | MetadataError::TooLarge(..)
        )
    }

    /// Map a reqwest error, pulling timeouts out into their own variant.
    pub(crate) fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MetadataError::Timeout
        } else {
            MetadataError::Request(err)
        }
    }
}
