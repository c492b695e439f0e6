//! Session persistence port
//!
//! The external CRUD store sessions are saved to. The chat controller works
//! on a local copy and pushes it here after each exchange.

use async_trait::async_trait;
use nurture_domain::{Message, Session, SessionId};
use thiserror::Error;

/// Errors from the session store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid session data: {0}")]
    InvalidData(String),
}

/// Gateway to the session store
#[async_trait]
pub trait SessionGateway: Send + Sync {
    async fn create_session(&self, title: &str, messages: &[Message]) -> Result<Session, PersistenceError>;

    async fn update_session(&self, id: &SessionId, messages: &[Message]) -> Result<(), PersistenceError>;

    async fn load_session(&self, id: &SessionId) -> Result<Session, PersistenceError>;
}
