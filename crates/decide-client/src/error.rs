//! Error types for the decision backend client.

use decide_core::DecideError;
use thiserror::Error;

/// Body text reported when a failed response carries none.
pub const NO_BODY: &str = "No response body";

#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The backend answered with a non-success status.
    #[error("API {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    /// The event stream broke after it was opened.
    #[error("stream read failed: {0}")]
    StreamRead(String),

    /// A success response whose body did not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A 204 where a body was required.
    #[error("no content returned from {0}")]
    NoContent(String),

    #[error("HTTP client setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Domain(#[from] DecideError),
}

impl ClientError {
    pub fn status(status: u16, url: &str, body: &str) -> Self {
        let body = if body.trim().is_empty() {
            NO_BODY.to_string()
        } else {
            body.to_string()
        };
        ClientError::Status {
            status,
            url: url.to_string(),
            body,
        }
    }

    /// HTTP status of a rejected request, if that is what this is.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_reported_as_missing() {
        let err = ClientError::status(502, "https://x/api/issues/", "  ");
        assert_eq!(err.to_string(), "API 502 for https://x/api/issues/: No response body");
        assert_eq!(err.status_code(), Some(502));
    }

    #[test]
    fn domain_errors_pass_through() {
        let err = ClientError::from(DecideError::CardAction("a reason is required".to_string()));
        assert_eq!(err.to_string(), "decision card action rejected: a reason is required");
        assert_eq!(err.status_code(), None);
    }
}
