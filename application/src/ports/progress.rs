//! Progress notification port
//!
//! The streaming placeholder's request is handed to a progress renderer
//! while the answer streams in.

use nurture_domain::{MessageId, OutgoingEnvelope};

/// Callback for progress updates during a chat exchange
///
/// Implementations live in the presentation layer.
pub trait ChatProgressNotifier: Send + Sync {
    /// A placeholder was allocated for `request`.
    fn on_stream_start(&self, placeholder: MessageId, request: &OutgoingEnvelope);

    /// A chunk of answer text arrived.
    fn on_stream_chunk(&self, _chunk: &str) {}

    /// The exchange reached its terminal event.
    fn on_stream_end(&self, placeholder: MessageId, success: bool);

    /// An attachment upload is in progress.
    fn on_upload_start(&self, _file_name: &str) {}
}

/// No-op progress notifier
pub struct NoChatProgress;

impl ChatProgressNotifier for NoChatProgress {
    fn on_stream_start(&self, _placeholder: MessageId, _request: &OutgoingEnvelope) {}
    fn on_stream_end(&self, _placeholder: MessageId, _success: bool) {}
}
