//! Chat behavior configuration from TOML (`[chat]` section)

use nurture_application::ChatMessages;
use serde::{Deserialize, Serialize};

/// Raw chat configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Wrap routed messages in the textual directive as well as the structured hint
    pub embed_routing_directive: bool,
    /// Overrides for user-facing texts (`[chat.messages]`)
    pub messages: ChatMessages,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            embed_routing_directive: true,
            messages: ChatMessages::default(),
        }
    }
}
