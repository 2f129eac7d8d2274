//! API Error Types
//!
//! Failures of the REST calls made by the console. Every variant is plain
//! data so the same type is produced by the native and the browser client.

use thiserror::Error;

use super::dto::PostFormError;

/// REST client errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Form input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend answered 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with another non-2xx status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Request could not be sent or the connection dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map a non-2xx status and its `{"error": ...}` text
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 404 {
            ApiError::NotFound(message)
        } else {
            ApiError::Status { status, message }
        }
    }
}

impl From<PostFormError> for ApiError {
    fn from(e: PostFormError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

#[cfg(feature = "native")]
impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// Result type for REST operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(
            ApiError::from_status(404, "gone"),
            ApiError::NotFound("gone".to_string())
        );
        assert!(matches!(
            ApiError::from_status(500, "boom"),
            ApiError::Status { status: 500, .. }
        ));
    }

    #[test]
    fn test_form_error_is_validation() {
        let e: ApiError = PostFormError::MissingMedia.into();
        assert_eq!(e.to_string(), "Validation error: A media file is required");
    }
}
