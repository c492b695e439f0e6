//! Session state store.
//!
//! [`SessionState`] owns the ordered message list and the session identity.
//! Every component mutates the list through it, and only by appending or by
//! replacing a message with the same id; nothing is ever reordered.
//!
//! # Streaming invariant
//!
//! At most one message is a streaming placeholder. Starting a stream records
//! a [`DispatchTicket`]; only the holder of the current ticket may finish it.
//! Resetting or loading a session bumps the epoch, which turns every
//! outstanding ticket stale.

use nurture_domain::{Message, MessageBody, MessageId, Session, SessionId};
use thiserror::Error;
use tracing::debug;

/// Identifies one in-flight exchange: its placeholder and the session epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchTicket {
    pub message_id: MessageId,
    pub epoch: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("A response is already streaming")]
    StreamAlreadyActive,

    #[error("Streaming placeholders can only be added by starting a stream")]
    UnexpectedPlaceholder,

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("A completed message cannot become a placeholder again")]
    RevertToStreaming,
}

/// Local working copy of the conversation
#[derive(Debug, Clone)]
pub struct SessionState {
    session_id: Option<SessionId>,
    title: Option<String>,
    messages: Vec<Message>,
    current_stream: Option<DispatchTicket>,
    epoch: u64,
}

impl SessionState {
    /// A new unsaved conversation, optionally opened by a seed message.
    pub fn new(seed: Option<Message>) -> Self {
        Self {
            session_id: None,
            title: None,
            messages: seed.into_iter().collect(),
            current_stream: None,
            epoch: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn set_session_id(&mut self, id: SessionId) {
        self.session_id = Some(id);
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The exchange currently streaming, if any.
    pub fn current_stream(&self) -> Option<DispatchTicket> {
        self.current_stream
    }

    pub fn is_streaming(&self) -> bool {
        self.current_stream.is_some()
    }

    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_streaming()).count()
    }

    /// Whether `ticket` still names the active exchange of this session.
    pub fn is_current(&self, ticket: DispatchTicket) -> bool {
        self.current_stream == Some(ticket) && ticket.epoch == self.epoch
    }

    /// Whether there is anything worth saving.
    pub fn has_user_messages(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.sender == nurture_domain::Sender::User)
    }

    /// Append a finished message.
    pub fn append(&mut self, message: Message) -> Result<MessageId, StateError> {
        if message.is_streaming() {
            return Err(StateError::UnexpectedPlaceholder);
        }
        let id = message.id;
        self.messages.push(message);
        Ok(id)
    }

    /// Replace the message with the same id, keeping its position.
    pub fn replace(&mut self, message: Message) -> Result<(), StateError> {
        let slot = self
            .messages
            .iter_mut()
            .find(|m| m.id == message.id)
            .ok_or(StateError::MessageNotFound(message.id))?;
        if message.is_streaming() {
            return Err(StateError::RevertToStreaming);
        }
        *slot = message;
        Ok(())
    }

    /// Append a streaming placeholder and make it the current exchange.
    pub fn begin_stream(&mut self, placeholder: Message) -> Result<DispatchTicket, StateError> {
        if self.current_stream.is_some() || self.streaming_count() > 0 {
            return Err(StateError::StreamAlreadyActive);
        }
        if !placeholder.is_streaming() {
            return Err(StateError::UnexpectedPlaceholder);
        }
        let ticket = DispatchTicket {
            message_id: placeholder.id,
            epoch: self.epoch,
        };
        self.messages.push(placeholder);
        self.current_stream = Some(ticket);
        debug!("Stream started: {}", ticket.message_id);
        Ok(ticket)
    }

    /// Turn the current placeholder into a text message.
    ///
    /// Returns `None` (and changes nothing) when `ticket` is stale: already
    /// finished, superseded, or from an earlier session epoch.
    pub fn finish_stream(
        &mut self,
        ticket: DispatchTicket,
        finish: impl FnOnce(&mut Message),
    ) -> Option<&Message> {
        if !self.is_current(ticket) {
            debug!("Ignoring stale stream event for {}", ticket.message_id);
            return None;
        }
        self.current_stream = None;
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == ticket.message_id)?;
        finish(message);
        if message.is_streaming() {
            // A finisher that forgot to set a body still must not leave a placeholder behind
            message.body = MessageBody::text(String::new());
        }
        Some(message)
    }

    /// Start over with a new unsaved conversation.
    pub fn reset(&mut self, seed: Option<Message>) {
        self.epoch += 1;
        self.session_id = None;
        self.title = None;
        self.current_stream = None;
        self.messages = seed.into_iter().collect();
    }

    /// Replace the local copy with a stored session.
    ///
    /// Any placeholder left in stored data is dropped; it can never complete.
    pub fn load(&mut self, session: Session) {
        self.epoch += 1;
        self.session_id = Some(session.id);
        self.title = Some(session.title);
        self.current_stream = None;
        self.messages = session
            .messages
            .into_iter()
            .filter(|m| !m.is_streaming())
            .collect();
    }

    /// The latest message carrying confirmation `confirmation_id`, if any.
    pub fn find_by_confirmation(&self, confirmation_id: &str) -> Option<&Message> {
        self.messages.iter().rev().find(|m| {
            m.confirmation_data
                .as_ref()
                .is_some_and(|c| c.confirmation_id.as_str() == confirmation_id)
        })
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(None)
    }
}
