//! Session domain entities

use crate::core::error::DomainError;
use crate::core::string::truncate_chars;
use crate::message::entities::{Message, Sender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum characters of the first user message used as a session title.
pub const TITLE_MAX_CHARS: usize = 50;

/// Backend-assigned session identifier (Value Object).
///
/// A conversation that has never been saved has no id at all; callers hold
/// an `Option<SessionId>` rather than a placeholder string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionId::new(s)
    }
}

/// A persisted conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, title: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id,
            title: title.into(),
            messages,
            updated_at: Utc::now(),
        }
    }
}

/// Derive a session title from its messages.
///
/// Uses the first non-empty user message, cut to [`TITLE_MAX_CHARS`]
/// characters with an ellipsis; falls back to `default_label`.
pub fn derive_title(messages: &[Message], default_label: &str) -> String {
    messages
        .iter()
        .filter(|m| m.sender == Sender::User && !m.is_seed)
        .map(|m| m.content().trim())
        .find(|content| !content.is_empty())
        .map(|content| truncate_chars(content, TITLE_MAX_CHARS))
        .unwrap_or_else(|| default_label.to_string())
}
