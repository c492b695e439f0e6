//! Chat session configuration.
//!
//! [`ChatConfig`] is assembled by the infrastructure config loader and handed
//! to the [`ChatController`](crate::use_cases::chat_controller::ChatController).
//! Nothing here changes during a session.

use nurture_domain::Message;
use serde::{Deserialize, Serialize};

/// User-facing texts.
///
/// Defaults are Japanese; every entry can be overridden from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessages {
    /// Seed message shown before any interaction.
    pub greeting: String,
    /// Replaces a streaming placeholder when the exchange fails.
    pub send_error: String,
    /// Appended when answering a confirmation fails.
    pub confirmation_error: String,
    /// Appended after a confirmation answered with "proceed".
    pub proceed_note: String,
    /// Title of a session whose first user message is unusable.
    pub default_title: String,
    /// Describes an attached image to the backend.
    pub image_description: String,
}

impl Default for ChatMessages {
    fn default() -> Self {
        Self {
            greeting: "こんにちは！子育ての悩みや気になることを、なんでも気軽に相談してください。"
                .to_string(),
            send_error: "申し訳ありません。エラーが発生しました。しばらくしてからもう一度お試しください。"
                .to_string(),
            confirmation_error: "申し訳ありません。確認の送信中にエラーが発生しました。もう一度お試しください。"
                .to_string(),
            proceed_note: "ご回答ありがとうございます。引き続き対応を進めます。".to_string(),
            default_title: "新しい相談".to_string(),
            image_description: "ユーザーが画像をアップロードしました".to_string(),
        }
    }
}

/// Bounds for attached images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentLimits {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality (1-100) of the re-encoded preview.
    pub jpeg_quality: u8,
    /// Directory the backend stores uploads in; remote paths are derived under it.
    pub server_upload_dir: String,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            jpeg_quality: 80,
            server_upload_dir: "/app/uploads/images".to_string(),
        }
    }
}

/// Configuration for one chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub user_id: String,
    /// Household context forwarded with every request.
    pub family_info: serde_json::Value,
    /// Also embed the textual routing directive, for backends that only read the message.
    pub embed_routing_directive: bool,
    pub messages: ChatMessages,
    pub attachments: AttachmentLimits,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            family_info: serde_json::Value::Object(Default::default()),
            embed_routing_directive: true,
            messages: ChatMessages::default(),
            attachments: AttachmentLimits::default(),
        }
    }
}

impl ChatConfig {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_family_info(mut self, family_info: serde_json::Value) -> Self {
        self.family_info = family_info;
        self
    }

    pub fn with_embed_routing_directive(mut self, embed: bool) -> Self {
        self.embed_routing_directive = embed;
        self
    }

    pub fn with_messages(mut self, messages: ChatMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_attachment_limits(mut self, limits: AttachmentLimits) -> Self {
        self.attachments = limits;
        self
    }

    /// A fresh seed message for a new conversation.
    pub fn seed_message(&self) -> Message {
        Message::seed(self.messages.greeting.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert!(config.embed_routing_directive);
        assert_eq!(config.attachments.max_width, 1024);
        assert!(config.family_info.is_object());
    }

    #[test]
    fn test_seed_message_uses_greeting() {
        let config = ChatConfig::new("u1").with_messages(ChatMessages {
            greeting: "やあ".into(),
            ..Default::default()
        });
        let seed = config.seed_message();
        assert!(seed.is_seed);
        assert_eq!(seed.content(), "やあ");
    }

    #[test]
    fn test_partial_messages_deserialize_with_defaults() {
        let messages: ChatMessages =
            serde_json::from_value(serde_json::json!({"greeting": "hi"})).unwrap();
        assert_eq!(messages.greeting, "hi");
        assert_eq!(messages.default_title, "新しい相談");
    }
}
