//! Streaming events for a chat exchange.
//!
//! [`StreamEvent`] bridges the transport's server-sent events to the
//! application layer. Exactly one terminal event ends an exchange.

use super::chat_response::ChatResponse;

/// An event in a streaming chat response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk of the answer, for progress display only.
    Delta(String),
    /// The full answer (signals stream end).
    Completed(ChatResponse),
    /// The backend or transport failed (signals stream end).
    Error(String),
}

impl StreamEvent {
    /// Returns the chunk text if this is a Delta event.
    pub fn delta(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}
