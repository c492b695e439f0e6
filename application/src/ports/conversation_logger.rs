//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording chat exchanges
//! (requests, answers, failures, confirmation answers) to a structured log.
//!
//! This is separate from `tracing`: tracing carries diagnostics, this port
//! carries the transcript in a machine-readable form (JSONL).

use serde_json::Value;

/// A structured conversation event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "chat_request", "chat_response", "confirmation_answer").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events.
///
/// `log` is synchronous and infallible; a broken log must never interrupt
/// a conversation.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
