//! Application-level configuration.
//!
//! - [`ChatConfig`]: identity, routing policy and localized texts for a chat session
//! - [`ChatMessages`]: user-facing strings (greeting, fallbacks, notes)
//! - [`AttachmentLimits`]: image resize/encode bounds and upload location

pub mod chat_config;

pub use chat_config::{AttachmentLimits, ChatConfig, ChatMessages};
