//! Chat transport port
//!
//! Defines how a request envelope reaches the streaming backend.

use async_trait::async_trait;
use nurture_domain::{OutgoingEnvelope, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while opening a chat stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Backend returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,
}

/// Handle for receiving streaming events of one exchange.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` fed by the adapter's reader task.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// A handle that replays a fixed list of events, then closes.
    pub fn from_events(events: Vec<StreamEvent>) -> Self {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity covers every event, so this never fails
            let _ = tx.try_send(event);
        }
        Self::new(rx)
    }

    /// Next event, or `None` once the stream is closed.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }
}

/// Transport to the streaming chat backend.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Start an exchange for `envelope` and return its event stream.
    async fn open_stream(&self, envelope: &OutgoingEnvelope) -> Result<StreamHandle, TransportError>;
}
