//! Confirmation gateway port
//!
//! Posts a user's answer to a confirmation request and returns the
//! backend's reply.

use async_trait::async_trait;
use nurture_domain::{ConfirmationAnswer, ConfirmationReply};
use thiserror::Error;

/// Errors of the confirmation exchange.
///
/// `NotAwaiting` and `UnknownConfirmation` are raised before any network
/// traffic; the rest come from the adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("No confirmation is awaiting an answer")]
    NotAwaiting,

    #[error("Unknown confirmation: {0}")]
    UnknownConfirmation(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid reply: {0}")]
    InvalidReply(String),
}

/// Gateway for answering confirmation requests
#[async_trait]
pub trait ConfirmationGateway: Send + Sync {
    async fn submit(&self, answer: &ConfirmationAnswer) -> Result<ConfirmationReply, ConfirmationError>;
}
