//! Message entities

use crate::confirmation::entities::ConfirmationRequest;
use crate::envelope::entities::OutgoingEnvelope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client-generated message identifier (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Display kind of a message, as exchanged with the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Audio,
    Image,
    Streaming,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Audio => "audio",
            MessageKind::Image => "image",
            MessageKind::Streaming => "streaming",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a message.
///
/// A streaming placeholder carries the request it stands for instead of
/// display text; it is replaced by a `Text` body exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    Text { text: String },
    Audio { transcript: String },
    Image {
        caption: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_path: Option<String>,
    },
    Streaming { request: Box<OutgoingEnvelope> },
}

impl MessageBody {
    pub fn text(text: impl Into<String>) -> Self {
        MessageBody::Text { text: text.into() }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            MessageBody::Text { .. } => MessageKind::Text,
            MessageBody::Audio { .. } => MessageKind::Audio,
            MessageBody::Image { .. } => MessageKind::Image,
            MessageBody::Streaming { .. } => MessageKind::Streaming,
        }
    }

    /// Display text. Empty for a streaming placeholder.
    pub fn display_text(&self) -> &str {
        match self {
            MessageBody::Text { text } => text,
            MessageBody::Audio { transcript } => transcript,
            MessageBody::Image { caption, .. } => caption,
            MessageBody::Streaming { .. } => "",
        }
    }
}

/// A message in the conversation list (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub body: MessageBody,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_up_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_data: Option<ConfirmationRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<serde_json::Value>,
    /// Fixed greeting shown before any interaction; never sent as history.
    #[serde(default)]
    pub is_seed: bool,
}

impl Message {
    fn with_body(sender: Sender, body: MessageBody) -> Self {
        Self {
            id: MessageId::new(),
            body,
            sender,
            timestamp: Utc::now(),
            follow_up_questions: Vec::new(),
            confirmation_data: None,
            search_data: None,
            debug_info: None,
            is_seed: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_body(Sender::User, MessageBody::text(content))
    }

    /// A user message that went out with an image attached.
    pub fn user_with_image(caption: impl Into<String>, image_path: Option<String>) -> Self {
        Self::with_body(
            Sender::User,
            MessageBody::Image {
                caption: caption.into(),
                image_path,
            },
        )
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_body(Sender::Assistant, MessageBody::text(content))
    }

    /// The fixed greeting that opens every conversation.
    pub fn seed(content: impl Into<String>) -> Self {
        let mut message = Self::assistant(content);
        message.is_seed = true;
        message
    }

    /// A placeholder for an assistant response that is still streaming.
    pub fn streaming_placeholder(request: OutgoingEnvelope) -> Self {
        Self::with_body(
            Sender::Assistant,
            MessageBody::Streaming {
                request: Box::new(request),
            },
        )
    }

    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    pub fn is_streaming(&self) -> bool {
        self.kind() == MessageKind::Streaming
    }

    pub fn content(&self) -> &str {
        self.body.display_text()
    }

    /// The request carried by a streaming placeholder.
    pub fn streaming_request(&self) -> Option<&OutgoingEnvelope> {
        match &self.body {
            MessageBody::Streaming { request } => Some(request),
            _ => None,
        }
    }
}
