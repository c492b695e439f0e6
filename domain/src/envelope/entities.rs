//! Outgoing envelope entities

use super::routing::RoutingHint;
use crate::message::entities::{Message, MessageId, MessageKind, Sender};
use crate::session::entities::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One prior message as sent in `conversation_history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: MessageId,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            content: message.content().to_string(),
            sender: message.sender,
            timestamp: message.timestamp,
            kind: message.kind(),
        }
    }
}

/// Description of an attached image for the backend's image specialist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultimodalContext {
    #[serde(rename = "type")]
    pub kind: String,
    pub image_description: String,
}

impl MultimodalContext {
    pub fn image(description: impl Into<String>) -> Self {
        Self {
            kind: "image".to_string(),
            image_description: description.into(),
        }
    }
}

/// Body of a streaming chat request (Value Object)
///
/// Built once per `send`; the streaming placeholder keeps a copy so the
/// progress renderer can show what is being answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingEnvelope {
    pub message: String,
    pub conversation_history: Vec<HistoryEntry>,
    pub session_id: Option<SessionId>,
    pub user_id: String,
    pub family_info: serde_json::Value,
    pub message_type: MessageKind,
    pub has_image: bool,
    pub image_path: Option<String>,
    pub multimodal_context: Option<MultimodalContext>,
    pub web_search_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_hint: Option<RoutingHint>,
}

impl OutgoingEnvelope {
    pub fn new(message: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_history: Vec::new(),
            session_id: None,
            user_id: user_id.into(),
            family_info: serde_json::Value::Object(Default::default()),
            message_type: MessageKind::Text,
            has_image: false,
            image_path: None,
            multimodal_context: None,
            web_search_enabled: false,
            routing_hint: None,
        }
    }

    /// Set history from the conversation so far.
    ///
    /// The seed greeting and any streaming placeholder are left out.
    pub fn with_history<'a>(mut self, messages: impl IntoIterator<Item = &'a Message>) -> Self {
        self.conversation_history = messages
            .into_iter()
            .filter(|m| !m.is_seed && !m.is_streaming())
            .map(HistoryEntry::from)
            .collect();
        self
    }

    pub fn with_session(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_family_info(mut self, family_info: serde_json::Value) -> Self {
        self.family_info = family_info;
        self
    }

    pub fn with_image(mut self, image_path: Option<String>, description: impl Into<String>) -> Self {
        self.message_type = MessageKind::Image;
        self.has_image = true;
        self.image_path = image_path;
        self.multimodal_context = Some(MultimodalContext::image(description));
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search_enabled = enabled;
        self
    }

    /// Attach the routing hint implied by the mode flags.
    ///
    /// With `embed_directive` the message text is also wrapped in the
    /// textual directive. Applying twice does not wrap twice.
    pub fn with_routing(mut self, embed_directive: bool) -> Self {
        if self.routing_hint.is_some() {
            return self;
        }
        self.routing_hint = RoutingHint::for_modes(self.web_search_enabled, self.has_image);
        if let (Some(hint), true) = (self.routing_hint, embed_directive) {
            self.message = hint.wrap(&self.message);
        }
        self
    }

    /// The user's own text, with any routing directive removed.
    pub fn literal_text(&self) -> &str {
        match self.routing_hint {
            Some(_) => RoutingHint::unwrap_directive(&self.message)
                .map(|(_, text)| text)
                .unwrap_or(&self.message),
            None => &self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::routing::WEB_SEARCH_DIRECTIVE_HEADER;

    #[test]
    fn test_plain_envelope_keeps_literal_text() {
        let envelope = OutgoingEnvelope::new("夜泣きがひどくて困っています", "u1").with_routing(true);
        assert_eq!(envelope.message, "夜泣きがひどくて困っています");
        assert_eq!(envelope.routing_hint, None);
        assert_eq!(envelope.message_type, MessageKind::Text);
    }

    #[test]
    fn test_history_excludes_seed_and_streaming() {
        let seed = Message::seed("ようこそ");
        let user = Message::user("前の質問");
        let placeholder = Message::streaming_placeholder(OutgoingEnvelope::new("x", "u1"));
        let envelope = OutgoingEnvelope::new("次", "u1").with_history([&seed, &user, &placeholder]);
        assert_eq!(envelope.conversation_history.len(), 1);
        assert_eq!(envelope.conversation_history[0].id, user.id);
    }

    #[test]
    fn test_web_search_routing_wraps_once() {
        let envelope = OutgoingEnvelope::new("近くの病院", "u1")
            .with_web_search(true)
            .with_routing(true)
            .with_routing(true);
        assert!(envelope.message.starts_with(WEB_SEARCH_DIRECTIVE_HEADER));
        assert_eq!(envelope.message.matches(WEB_SEARCH_DIRECTIVE_HEADER).count(), 1);
        assert_eq!(envelope.routing_hint, Some(RoutingHint::WebSearch));
        assert_eq!(envelope.literal_text(), "近くの病院");
    }

    #[test]
    fn test_structured_only_routing() {
        let envelope = OutgoingEnvelope::new("近くの病院", "u1")
            .with_web_search(true)
            .with_routing(false);
        assert_eq!(envelope.message, "近くの病院");
        assert_eq!(envelope.routing_hint, Some(RoutingHint::WebSearch));
    }

    #[test]
    fn test_image_envelope_fields() {
        let envelope = OutgoingEnvelope::new("これは何？", "u1")
            .with_image(Some("/uploads/x.jpg".into()), "photo.jpg")
            .with_routing(true);
        assert!(envelope.has_image);
        assert_eq!(envelope.message_type, MessageKind::Image);
        assert_eq!(envelope.routing_hint, Some(RoutingHint::ImageAnalysis));
        assert_eq!(envelope.multimodal_context.as_ref().unwrap().kind, "image");
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(OutgoingEnvelope::new("hi", "u1")).unwrap();
        for key in [
            "message",
            "conversation_history",
            "session_id",
            "user_id",
            "family_info",
            "message_type",
            "has_image",
            "image_path",
            "multimodal_context",
            "web_search_enabled",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["message_type"], "text");
        assert!(json["session_id"].is_null());
    }
}
