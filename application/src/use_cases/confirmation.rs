//! Confirmation sub-protocol handler.
//!
//! Tracks the [`ConfirmationState`] machine:
//!
//! ```text
//! None --response with confirmation--> Awaiting --answer--> Resolving --reply/error--> None
//! ```
//!
//! Answering is split like sending: [`ConfirmationHandler::begin_answer`]
//! validates and builds the [`ConfirmationAnswer`], the caller submits it,
//! and [`ConfirmationHandler::finish`] applies the outcome. Every path out of
//! `Resolving` ends in `None`, so input never stays locked after an answer.

use super::session_state::SessionState;
use crate::config::ChatMessages;
use crate::ports::confirmation_gateway::ConfirmationError;
use chrono::{DateTime, Utc};
use nurture_domain::{
    ActionType, ConfirmationAnswer, ConfirmationReply, ConfirmationRequest, ConfirmationState,
    FollowupAction, Message, MessageId, ResponseMetadata,
};
use serde_json::Value;
use tracing::{debug, info, warn};

/// How an answered confirmation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// The backend replied; `action` is what it asked for, if anything.
    Resolved { action: Option<FollowupAction> },
    /// Submitting failed; a generic error message was appended.
    Failed { error: String },
}

impl AnswerOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, AnswerOutcome::Resolved { .. })
    }

    pub fn action_type(&self) -> Option<&ActionType> {
        match self {
            AnswerOutcome::Resolved { action } => action.as_ref().map(|a| &a.action_type),
            AnswerOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfirmationHandler {
    state: ConfirmationState,
}

impl ConfirmationHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn blocks_input(&self) -> bool {
        self.state.blocks_input()
    }

    pub fn pending(&self) -> Option<&ConfirmationRequest> {
        self.state.pending_request()
    }

    /// Whether the advisory timeout of the pending request has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match &self.state {
            ConfirmationState::Awaiting {
                request,
                received_at,
                ..
            } => request.is_expired(*received_at, now),
            _ => false,
        }
    }

    /// Record a confirmation request that arrived on `message_id`.
    ///
    /// A request arriving while another is pending replaces it.
    pub fn on_response(&mut self, request: ConfirmationRequest, message_id: MessageId) {
        if let Some(previous) = self.state.pending_request() {
            warn!(
                "Confirmation {} superseded by {}",
                previous.confirmation_id, request.confirmation_id
            );
        }
        info!("Awaiting confirmation {}", request.confirmation_id);
        self.state = ConfirmationState::Awaiting {
            request,
            message_id,
            received_at: Utc::now(),
        };
    }

    /// Validate an answer and move to `Resolving`.
    ///
    /// Rejections happen before any network traffic and leave the state as is.
    pub fn begin_answer(
        &mut self,
        session: &SessionState,
        confirmation_id: &str,
        choice: &str,
        user_id: &str,
    ) -> Result<ConfirmationAnswer, ConfirmationError> {
        let (request, message_id) = match &self.state {
            ConfirmationState::Awaiting {
                request,
                message_id,
                ..
            } => (request, *message_id),
            _ => return Err(ConfirmationError::NotAwaiting),
        };
        if request.confirmation_id.as_str() != confirmation_id {
            return Err(ConfirmationError::UnknownConfirmation(
                confirmation_id.to_string(),
            ));
        }

        // The owning message is the source of truth; fall back to the cached request
        let owned = |m: &&Message| {
            m.confirmation_data
                .as_ref()
                .is_some_and(|c| c.confirmation_id.as_str() == confirmation_id)
        };
        let context_data = session
            .message(message_id)
            .filter(owned)
            .or_else(|| session.find_by_confirmation(confirmation_id))
            .and_then(|m| m.confirmation_data.as_ref())
            .map(|c| c.context_data.clone())
            .unwrap_or_else(|| request.context_data.clone());
        let context_data = if context_data.is_null() {
            Value::Object(Default::default())
        } else {
            context_data
        };

        let answer = ConfirmationAnswer {
            confirmation_id: request.confirmation_id.clone(),
            user_response: choice.to_string(),
            user_id: user_id.to_string(),
            session_id: session.session_id().cloned(),
            response_metadata: ResponseMetadata { context_data },
        };

        debug!("Answering confirmation {} with {:?}", confirmation_id, choice);
        self.state = ConfirmationState::Resolving {
            confirmation_id: answer.confirmation_id.clone(),
            message_id,
        };
        Ok(answer)
    }

    /// Apply the submission result and return to `None`.
    ///
    /// Returns `None` without touching anything when no answer is resolving
    /// (for instance after the session was reset mid-flight).
    pub fn finish(
        &mut self,
        session: &mut SessionState,
        result: Result<ConfirmationReply, ConfirmationError>,
        texts: &ChatMessages,
    ) -> Option<(AnswerOutcome, Vec<Message>)> {
        let ConfirmationState::Resolving {
            confirmation_id, ..
        } = &self.state
        else {
            debug!("Ignoring confirmation result with nothing resolving");
            return None;
        };
        let confirmation_id = confirmation_id.clone();
        self.state = ConfirmationState::None;

        let mut appended = Vec::new();
        let outcome = match result {
            Ok(reply) => {
                info!(
                    "Confirmation {} resolved (action: {:?})",
                    confirmation_id,
                    reply.followup_action.as_ref().map(|a| &a.action_type)
                );
                appended.push(Message::assistant(reply.message));
                if reply
                    .followup_action
                    .as_ref()
                    .is_some_and(|a| a.action_type == ActionType::Proceed)
                {
                    appended.push(Message::assistant(texts.proceed_note.clone()));
                }
                AnswerOutcome::Resolved {
                    action: reply.followup_action,
                }
            }
            Err(e) => {
                warn!("Confirmation {} failed: {}", confirmation_id, e);
                appended.push(Message::assistant(texts.confirmation_error.clone()));
                AnswerOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        for message in &appended {
            if let Err(e) = session.append(message.clone()) {
                warn!("Could not append confirmation message: {}", e);
            }
        }
        Some((outcome, appended))
    }

    /// Drop any pending or resolving confirmation.
    pub fn reset(&mut self) {
        self.state = ConfirmationState::None;
    }
}
