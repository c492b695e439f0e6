//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use application types where appropriate.

mod backend;
mod chat;
mod logging;
mod output;
mod repl;
mod user;

pub use backend::FileBackendConfig;
pub use chat::FileChatConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use repl::FileReplConfig;
pub use user::FileUserConfig;

// The [attachments] section maps one-to-one onto the application type
pub use nurture_application::AttachmentLimits as FileAttachmentsConfig;

use nurture_application::ChatConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Backend endpoint settings
    pub backend: FileBackendConfig,
    /// Identity and household context
    pub user: FileUserConfig,
    /// Routing policy and user-facing texts
    pub chat: FileChatConfig,
    /// Image resize bounds and upload location
    pub attachments: FileAttachmentsConfig,
    /// Conversation transcript
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted path of the offending key, e.g. `backend.base_url`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Errors make the configuration unusable; warnings are printed and the
    /// offending value is used as-is or replaced by its default.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let base_url = self.backend.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            issues.push(ConfigIssue::error(
                "backend.base_url",
                format!("'{}' is not an http(s) URL", self.backend.base_url),
            ));
        }
        if self.backend.timeout_seconds == 0 {
            issues.push(ConfigIssue::warning(
                "backend.timeout_seconds",
                "0 disables the timeout",
            ));
        }

        if self.user.user_id.trim().is_empty() {
            issues.push(ConfigIssue::error("user.user_id", "must not be empty"));
        }
        if !self.user.family_info.is_object() {
            issues.push(ConfigIssue::warning(
                "user.family_info",
                "should be a table; it is sent as-is",
            ));
        }

        if self.attachments.max_width == 0 || self.attachments.max_height == 0 {
            issues.push(ConfigIssue::error(
                "attachments.max_width",
                "image bounds must be positive",
            ));
        }
        if !(1..=100).contains(&self.attachments.jpeg_quality) {
            issues.push(ConfigIssue::error(
                "attachments.jpeg_quality",
                format!("{} is outside 1-100", self.attachments.jpeg_quality),
            ));
        }

        issues
    }

    /// Whether any issue is an error.
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// The application-level chat configuration.
    pub fn to_chat_config(&self) -> ChatConfig {
        ChatConfig::new(self.user.user_id.trim())
            .with_family_info(self.user.family_info.clone())
            .with_embed_routing_directive(self.chat.embed_routing_directive)
            .with_messages(self.chat.messages.clone())
            .with_attachment_limits(self.attachments.clone())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.backend.base_url.trim().trim_end_matches('/')
    }

    /// Request timeout, `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.backend.timeout_seconds > 0)
            .then(|| Duration::from_secs(self.backend.timeout_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[backend]
base_url = "https://nurture.example.com/"
timeout_seconds = 30

[user]
user_id = "parent-1"

[user.family_info]
prefecture = "東京都"

[chat]
embed_routing_directive = false

[attachments]
max_width = 800
jpeg_quality = 70

[logging]
conversation_log = "~/.local/share/nurture-chat/conversation.jsonl"

[repl]
show_progress = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_url(), "https://nurture.example.com");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.attachments.max_width, 800);
        assert_eq!(config.attachments.max_height, 1024);
        assert_eq!(config.attachments.jpeg_quality, 70);
        assert!(config.logging.conversation_log.is_some());
        assert!(!config.repl.show_progress);
        assert!(config.validate().is_empty());

        let chat = config.to_chat_config();
        assert_eq!(chat.user_id, "parent-1");
        assert_eq!(chat.family_info, json!({"prefecture": "東京都"}));
        assert!(!chat.embed_routing_directive);
        assert_eq!(chat.attachments.max_width, 800);
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.user.user_id, "anonymous");
        assert!(config.chat.embed_routing_directive);
        assert!(config.logging.conversation_log.is_none());
        assert!(config.output.color);
        assert!(config.repl.show_progress);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_bad_values() {
        let mut config = FileConfig::default();
        config.backend.base_url = "localhost:8000".to_string();
        config.attachments.jpeg_quality = 0;
        config.user.family_info = json!("two kids");

        let issues = config.validate();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            ["backend.base_url", "user.family_info", "attachments.jpeg_quality"]
        );
        assert!(FileConfig::has_errors(&issues));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let mut config = FileConfig::default();
        config.backend.timeout_seconds = 0;
        assert!(config.request_timeout().is_none());
        assert!(!FileConfig::has_errors(&config.validate()));
    }
}
