//! Error types for the HTTP backend adapters

use nurture_application::{ConfirmationError, PersistenceError, TransportError, UploadError};
use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur when talking to the chat backend over HTTP
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Backend returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Classify a reqwest error.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else if e.is_builder() {
            BackendError::InvalidRequest(e.to_string())
        } else {
            BackendError::Connection(e.to_string())
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::from_reqwest(e)
    }
}

impl From<BackendError> for TransportError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Timeout => TransportError::Timeout,
            BackendError::HttpStatus { status, body } => TransportError::HttpStatus {
                status,
                message: body,
            },
            BackendError::Decode(msg) => TransportError::StreamError(msg),
            other => TransportError::ConnectionError(other.to_string()),
        }
    }
}

impl From<BackendError> for ConfirmationError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Decode(msg) => ConfirmationError::InvalidReply(msg),
            other => ConfirmationError::RequestFailed(other.to_string()),
        }
    }
}

impl From<BackendError> for UploadError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::HttpStatus { status, body } if (400..500).contains(&status) => {
                UploadError::Rejected(format!("HTTP {}: {}", status, body))
            }
            other => UploadError::RequestFailed(other.to_string()),
        }
    }
}

impl From<BackendError> for PersistenceError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::HttpStatus { status: 404, body } => PersistenceError::NotFound(body),
            BackendError::Decode(msg) => PersistenceError::InvalidData(msg),
            other => PersistenceError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> BackendError {
        BackendError::HttpStatus {
            status: code,
            body: "oops".to_string(),
        }
    }

    #[test]
    fn test_transport_mapping() {
        assert_eq!(TransportError::from(BackendError::Timeout), TransportError::Timeout);
        assert_eq!(
            TransportError::from(status(502)),
            TransportError::HttpStatus {
                status: 502,
                message: "oops".to_string()
            }
        );
    }

    #[test]
    fn test_persistence_not_found() {
        assert!(matches!(
            PersistenceError::from(status(404)),
            PersistenceError::NotFound(_)
        ));
        assert!(matches!(
            PersistenceError::from(status(500)),
            PersistenceError::Unavailable(_)
        ));
    }

    #[test]
    fn test_upload_client_errors_are_rejections() {
        assert!(matches!(UploadError::from(status(413)), UploadError::Rejected(_)));
        assert!(matches!(
            UploadError::from(BackendError::Timeout),
            UploadError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(status(418).status(), Some(418));
        assert_eq!(BackendError::Timeout.status(), None);
    }
}
