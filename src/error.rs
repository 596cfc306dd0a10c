//! Client Error Types
//!
//! Errors for calls against the attendance backend and the device
//! middleware proxy, with the server-provided message surfaced when
//! one is available.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the backend
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// 413 on person enrollment, almost always an oversized face photo.
    #[error("Payload too large: face photo exceeds the upload limit")]
    PayloadTooLarge,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Error body shape returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ClientError {
    /// Map a transport-level reqwest error to the closest variant.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_connect() {
            ClientError::Unavailable
        } else {
            ClientError::Request(e)
        }
    }

    /// Build an API error from a non-success response, preferring the
    /// server's `message` field over the raw body.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        if status == 413 {
            return ClientError::PayloadTooLarge;
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                if text.is_empty() {
                    "request failed".to_string()
                } else {
                    text
                }
            });

        ClientError::Api { status, message }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Unavailable | ClientError::Timeout)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Timeout.is_transient());
        assert!(ClientError::Unavailable.is_transient());
        assert!(!ClientError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
        assert!(!ClientError::PayloadTooLarge.is_transient());
    }

    #[test]
    fn test_error_body_message_parse() {
        let body: ErrorBody = serde_json::from_str(r#"{"message": "duplicate person"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("duplicate person"));
    }
}
