//! Streaming request dispatcher.
//!
//! Sending is split in two synchronous halves around the transport:
//!
//! 1. [`StreamingDispatcher::begin`] validates the request, appends the
//!    optimistic user message, builds the [`OutgoingEnvelope`] and allocates
//!    the streaming placeholder. It returns a [`Dispatch`] holding the
//!    [`DispatchTicket`] for the exchange.
//! 2. [`StreamingDispatcher::complete`] or [`StreamingDispatcher::fail`]
//!    applies the terminal event. Either is a no-op for a stale ticket.
//!
//! The controller's async `send` composes the two; an event-driven surface
//! can call them separately and apply late events safely.

use super::session_state::SessionState;
pub use super::session_state::DispatchTicket;
use nurture_domain::{
    ChatResponse, ConfirmationRequest, Message, MessageBody, MessageId, OutgoingEnvelope,
};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// Why a send was refused. The conversation is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    /// A confirmation must be answered first.
    AwaitingConfirmation,
    /// A response is still streaming.
    InFlight,
    /// No text and no attachment.
    Empty,
}

impl fmt::Display for SendRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendRejection::AwaitingConfirmation => write!(f, "awaiting confirmation"),
            SendRejection::InFlight => write!(f, "a response is still streaming"),
            SendRejection::Empty => write!(f, "nothing to send"),
        }
    }
}

/// Image part of an outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingImage {
    /// Server path, or the local preview when the upload failed.
    pub path: Option<String>,
    /// Text for the multimodal context.
    pub description: String,
}

/// What the user asked to send.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SendRequest {
    pub text: String,
    pub image: Option<OutgoingImage>,
    pub web_search: bool,
}

impl SendRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: OutgoingImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }
}

/// A started exchange.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub ticket: DispatchTicket,
    pub user_message: MessageId,
    pub envelope: OutgoingEnvelope,
}

/// Result of applying a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message_id: MessageId,
    pub confirmation: Option<ConfirmationRequest>,
    pub follow_ups: Vec<String>,
}

/// Fixed per-user data copied into every envelope.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub user_id: String,
    pub family_info: Value,
    pub embed_routing_directive: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            family_info: Value::Object(Default::default()),
            embed_routing_directive: true,
        }
    }
}

/// Drives one streaming exchange at a time against a [`SessionState`].
#[derive(Debug, Clone, Default)]
pub struct StreamingDispatcher {
    settings: DispatchSettings,
}

impl StreamingDispatcher {
    pub fn new(settings: DispatchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Check the preconditions of a send without mutating anything.
    pub fn check(
        &self,
        state: &SessionState,
        request: &SendRequest,
        awaiting_confirmation: bool,
    ) -> Result<(), SendRejection> {
        if awaiting_confirmation {
            return Err(SendRejection::AwaitingConfirmation);
        }
        if state.is_streaming() {
            return Err(SendRejection::InFlight);
        }
        if request.text.trim().is_empty() && request.image.is_none() {
            return Err(SendRejection::Empty);
        }
        Ok(())
    }

    /// Start an exchange.
    ///
    /// History in the envelope is the conversation before this message;
    /// the message itself travels in the envelope's text.
    pub fn begin(
        &self,
        state: &mut SessionState,
        request: SendRequest,
        awaiting_confirmation: bool,
    ) -> Result<Dispatch, SendRejection> {
        if let Err(rejection) = self.check(state, &request, awaiting_confirmation) {
            debug!("Send rejected: {}", rejection);
            return Err(rejection);
        }

        let text = request.text.trim().to_string();
        let mut envelope = OutgoingEnvelope::new(text.clone(), self.settings.user_id.clone())
            .with_history(state.messages())
            .with_session(state.session_id().cloned())
            .with_family_info(self.settings.family_info.clone())
            .with_web_search(request.web_search);

        let user_message = match &request.image {
            Some(image) => {
                envelope = envelope.with_image(image.path.clone(), image.description.clone());
                Message::user_with_image(text, image.path.clone())
            }
            None => Message::user(text),
        };
        envelope = envelope.with_routing(self.settings.embed_routing_directive);

        let user_id = user_message.id;
        // Preconditions were checked above, so neither call can fail
        state
            .append(user_message)
            .map_err(|_| SendRejection::InFlight)?;
        let ticket = state
            .begin_stream(Message::streaming_placeholder(envelope.clone()))
            .map_err(|_| SendRejection::InFlight)?;

        info!(
            "Dispatching message (web_search: {}, image: {}, history: {})",
            envelope.web_search_enabled,
            envelope.has_image,
            envelope.conversation_history.len()
        );

        Ok(Dispatch {
            ticket,
            user_message: user_id,
            envelope,
        })
    }

    /// Apply a completed response. `None` when the ticket is stale.
    pub fn complete(
        &self,
        state: &mut SessionState,
        ticket: DispatchTicket,
        response: &ChatResponse,
    ) -> Option<Completion> {
        let confirmation = response.confirmation_request();
        if confirmation.is_none()
            && response
                .confirmation_data
                .as_ref()
                .is_some_and(|v| !v.is_null())
        {
            warn!("Ignoring malformed confirmation payload");
        }
        let follow_ups = response.follow_up_questions();
        let text = response.cleaned_text();

        let finished = state.finish_stream(ticket, |message| {
            message.body = MessageBody::text(text);
            message.confirmation_data = confirmation.clone();
            message.search_data = response.search_data();
            message.debug_info = response.debug_info();
            message.follow_up_questions = follow_ups.clone();
        })?;

        debug!(
            "Stream completed: {} (confirmation: {}, follow-ups: {})",
            finished.id,
            confirmation.is_some(),
            follow_ups.len()
        );
        Some(Completion {
            message_id: finished.id,
            confirmation,
            follow_ups,
        })
    }

    /// Replace the placeholder with `fallback`. `false` when the ticket is stale.
    pub fn fail(&self, state: &mut SessionState, ticket: DispatchTicket, fallback: &str) -> bool {
        state
            .finish_stream(ticket, |message| {
                message.body = MessageBody::text(fallback);
            })
            .is_some()
    }
}
