//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Only image files can be attached (got {0})")]
    InvalidImageType(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    /// Whether the error should be shown to the user and otherwise ignored.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidImageType(_) | DomainError::EmptyMessage
        )
    }
}
