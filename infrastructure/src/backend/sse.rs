//! SSE frame parsing for the chat stream.
//!
//! Each `data:` payload is a JSON object tagged by `type`:
//!
//! ```text
//! {"type":"chunk","content":"..."}
//! {"type":"complete","response":"...","confirmation_data":{...},...}
//! {"type":"error","message":"..."}
//! ```

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use nurture_domain::{ChatResponse, StreamEvent};
use serde::Deserialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SseFrame {
    Chunk {
        #[serde(default)]
        content: String,
    },
    Complete(ChatResponse),
    Error {
        #[serde(default)]
        message: String,
    },
}

impl From<SseFrame> for StreamEvent {
    fn from(frame: SseFrame) -> Self {
        match frame {
            SseFrame::Chunk { content } => StreamEvent::Delta(content),
            SseFrame::Complete(response) => StreamEvent::Completed(response),
            SseFrame::Error { message } if message.trim().is_empty() => {
                StreamEvent::Error("backend reported an error".to_string())
            }
            SseFrame::Error { message } => StreamEvent::Error(message),
        }
    }
}

/// Parse one `data:` payload.
///
/// Returns `None` for keep-alives, `[DONE]` markers, unknown frame types and
/// malformed JSON; none of them end the stream.
pub fn parse_frame(data: &str) -> Option<StreamEvent> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    match serde_json::from_str::<SseFrame>(data) {
        Ok(frame) => Some(frame.into()),
        Err(e) => {
            warn!("Skipping unreadable SSE frame: {}", e);
            None
        }
    }
}

/// Read SSE events from `bytes` and forward them to `tx`.
///
/// Stops after the first terminal event, when the receiver is gone, or when
/// the byte stream ends or breaks. A broken stream is reported as an
/// [`StreamEvent::Error`]; a clean end without a terminal event simply
/// closes the channel.
pub async fn forward_events<S, B, E>(bytes: S, tx: mpsc::Sender<StreamEvent>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut events = Box::pin(bytes.eventsource());
    while let Some(next) = events.next().await {
        let event = match next {
            Ok(event) => match parse_frame(&event.data) {
                Some(event) => event,
                None => continue,
            },
            Err(e) => StreamEvent::Error(format!("SSE stream error: {}", e)),
        };
        let terminal = event.is_terminal();
        if tx.send(event).await.is_err() {
            debug!("Stream receiver dropped");
            return;
        }
        if terminal {
            return;
        }
    }
    debug!("SSE stream ended");
}
