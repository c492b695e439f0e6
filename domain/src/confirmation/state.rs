//! Confirmation state machine

use super::entities::{ConfirmationId, ConfirmationRequest};
use crate::message::entities::MessageId;
use chrono::{DateTime, Utc};

/// Where the confirmation exchange currently stands.
///
/// While `Awaiting` or `Resolving`, new submissions are locked out.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfirmationState {
    #[default]
    None,
    Awaiting {
        request: ConfirmationRequest,
        message_id: MessageId,
        received_at: DateTime<Utc>,
    },
    Resolving {
        confirmation_id: ConfirmationId,
        message_id: MessageId,
    },
}

impl ConfirmationState {
    pub fn is_none(&self) -> bool {
        matches!(self, ConfirmationState::None)
    }

    /// Whether input should be locked.
    pub fn blocks_input(&self) -> bool {
        !self.is_none()
    }

    pub fn pending_request(&self) -> Option<&ConfirmationRequest> {
        match self {
            ConfirmationState::Awaiting { request, .. } => Some(request),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfirmationState::None => "none",
            ConfirmationState::Awaiting { .. } => "awaiting",
            ConfirmationState::Resolving { .. } => "resolving",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_none_and_unlocked() {
        let state = ConfirmationState::default();
        assert!(state.is_none());
        assert!(!state.blocks_input());
        assert_eq!(state.label(), "none");
    }

    #[test]
    fn test_awaiting_and_resolving_block_input() {
        let request = ConfirmationRequest::from_payload(&json!({"confirmation_id": "c", "question": "q"})).unwrap();
        let awaiting = ConfirmationState::Awaiting {
            request: request.clone(),
            message_id: MessageId::new(),
            received_at: Utc::now(),
        };
        assert!(awaiting.blocks_input());
        assert_eq!(awaiting.pending_request(), Some(&request));

        let resolving = ConfirmationState::Resolving {
            confirmation_id: request.confirmation_id,
            message_id: MessageId::new(),
        };
        assert!(resolving.blocks_input());
        assert!(resolving.pending_request().is_none());
    }
}
