//! Chat events emitted by the ChatController for presentation rendering
//!
//! These form the output port from the application layer to the
//! presentation layer. A surface drains them after each command and
//! renders whatever changed.

use crate::use_cases::dispatcher::SendRejection;
use nurture_domain::{ConfirmationRequest, Message, SessionId};

/// Events emitted by the ChatController
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    // === Message list ===
    /// A message was appended to the conversation.
    MessageAppended(Message),
    /// A message was replaced in place (placeholder completed or failed).
    MessageReplaced(Message),

    // === Input surface ===
    /// A send was refused without touching the conversation.
    SendRejected(SendRejection),
    /// Suggested follow-up questions changed (possibly to empty).
    FollowUpsUpdated(Vec<String>),
    /// Web-search mode was switched.
    WebSearchChanged { enabled: bool },
    /// An image was attached.
    AttachmentSelected { file_name: String, width: u32, height: u32 },
    /// The attachment was cleared.
    AttachmentCleared,
    /// An attachment could not be used.
    AttachmentRejected { reason: String },

    // === Confirmation ===
    /// A confirmation is awaiting the user's answer; input is locked.
    ConfirmationRequested(ConfirmationRequest),
    /// The confirmation exchange ended; input is unlocked.
    ConfirmationResolved { succeeded: bool },

    // === Session ===
    /// The conversation was saved under this id.
    SessionSaved(SessionId),
    /// A stored conversation replaced the local one.
    SessionLoaded { id: SessionId, title: String },
    /// A new empty conversation was started.
    SessionReset,
    /// Saving failed; the conversation continues unsaved.
    SessionSaveFailed { error: String },
}
