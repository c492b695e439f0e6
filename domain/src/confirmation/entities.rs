//! Confirmation entities

use crate::session::entities::SessionId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Correlates a confirmation request with its answer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationId(String);

impl ConfirmationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A question the backend needs answered before it continues (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub confirmation_id: ConfirmationId,
    pub question: String,
    pub options: Vec<String>,
    /// Opaque blob handed back verbatim with the answer.
    #[serde(default = "empty_object")]
    pub context_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl ConfirmationRequest {
    /// Parse a request out of a loosely-typed response payload.
    ///
    /// Anything malformed yields `None`: a missing or unusable request is
    /// simply absent. A request needs a non-empty id and a question;
    /// non-string options are skipped.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let object = payload.as_object()?;
        let confirmation_id = object
            .get("confirmation_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())?;
        let question = object.get("question").and_then(Value::as_str)?;
        let options = object
            .get("options")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let context_data = object
            .get("context_data")
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(empty_object);
        let timeout_seconds = object.get("timeout_seconds").and_then(Value::as_u64);

        Some(Self {
            confirmation_id: ConfirmationId::new(confirmation_id),
            question: question.to_string(),
            options,
            context_data,
            timeout_seconds,
        })
    }

    /// When the advisory timeout runs out, if one was given.
    ///
    /// A timeout too large to represent counts as no timeout.
    pub fn expires_at(&self, received_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.timeout_seconds?).ok()?;
        received_at.checked_add_signed(Duration::try_seconds(seconds)?)
    }

    /// Whether the advisory timeout has passed. Never enforced.
    pub fn is_expired(&self, received_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.expires_at(received_at)
            .is_some_and(|deadline| now >= deadline)
    }
}

/// Metadata sent alongside an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub context_data: Value,
}

/// The user's answer as posted to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationAnswer {
    pub confirmation_id: ConfirmationId,
    pub user_response: String,
    pub user_id: String,
    pub session_id: Option<SessionId>,
    pub response_metadata: ResponseMetadata,
}

/// What the backend wants to happen after an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Proceed,
    Cancel,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupAction {
    pub action_type: ActionType,
}

impl FollowupAction {
    pub fn proceed() -> Self {
        Self {
            action_type: ActionType::Proceed,
        }
    }

    pub fn cancel() -> Self {
        Self {
            action_type: ActionType::Cancel,
        }
    }
}

/// Backend reply to a [`ConfirmationAnswer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub followup_action: Option<FollowupAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload_full() {
        let payload = json!({
            "confirmation_id": "c-1",
            "question": "病院を検索しますか？",
            "options": ["はい", "いいえ"],
            "context_data": {"area": "渋谷"},
            "timeout_seconds": 300
        });
        let request = ConfirmationRequest::from_payload(&payload).unwrap();
        assert_eq!(request.confirmation_id.as_str(), "c-1");
        assert_eq!(request.options, vec!["はい", "いいえ"]);
        assert_eq!(request.context_data, json!({"area": "渋谷"}));
        assert_eq!(request.timeout_seconds, Some(300));
    }

    #[test]
    fn test_from_payload_defaults_context() {
        let payload = json!({"confirmation_id": "c-2", "question": "続けますか？", "context_data": null});
        let request = ConfirmationRequest::from_payload(&payload).unwrap();
        assert_eq!(request.context_data, json!({}));
        assert!(request.options.is_empty());
        assert_eq!(request.timeout_seconds, None);
    }

    #[test]
    fn test_from_payload_malformed_is_absent() {
        assert!(ConfirmationRequest::from_payload(&json!(null)).is_none());
        assert!(ConfirmationRequest::from_payload(&json!("text")).is_none());
        assert!(ConfirmationRequest::from_payload(&json!({"question": "q"})).is_none());
        assert!(
            ConfirmationRequest::from_payload(&json!({"confirmation_id": " ", "question": "q"}))
                .is_none()
        );
        assert!(ConfirmationRequest::from_payload(&json!({"confirmation_id": "c"})).is_none());
    }

    #[test]
    fn test_from_payload_skips_non_string_options() {
        let payload = json!({"confirmation_id": "c", "question": "q", "options": ["a", 1, null, "b"]});
        let request = ConfirmationRequest::from_payload(&payload).unwrap();
        assert_eq!(request.options, vec!["a", "b"]);
    }

    #[test]
    fn test_expiry_is_advisory_arithmetic() {
        let payload = json!({"confirmation_id": "c", "question": "q", "timeout_seconds": 60});
        let request = ConfirmationRequest::from_payload(&payload).unwrap();
        let received = Utc::now();
        assert!(!request.is_expired(received, received + Duration::seconds(59)));
        assert!(request.is_expired(received, received + Duration::seconds(60)));

        let no_timeout = ConfirmationRequest::from_payload(&json!({"confirmation_id": "c", "question": "q"})).unwrap();
        assert!(!no_timeout.is_expired(received, received + Duration::days(365)));
    }

    #[test]
    fn test_unrepresentable_timeout_never_expires() {
        let received = Utc::now();
        for timeout in [100_000_000_000_000_000_u64, u64::MAX] {
            let payload = json!({"confirmation_id": "c", "question": "q", "timeout_seconds": timeout});
            let request = ConfirmationRequest::from_payload(&payload).unwrap();
            assert_eq!(request.timeout_seconds, Some(timeout));
            assert_eq!(request.expires_at(received), None);
            assert!(!request.is_expired(received, received));
        }
    }

    #[test]
    fn test_reply_parses_unknown_action() {
        let reply: ConfirmationReply = serde_json::from_value(json!({
            "message": "了解しました",
            "followup_action": {"action_type": "retry"}
        }))
        .unwrap();
        assert_eq!(reply.followup_action.unwrap().action_type, ActionType::Other);
    }

    #[test]
    fn test_answer_wire_shape() {
        let answer = ConfirmationAnswer {
            confirmation_id: ConfirmationId::new("c-1"),
            user_response: "はい".into(),
            user_id: "u1".into(),
            session_id: None,
            response_metadata: ResponseMetadata {
                context_data: json!({"k": 1}),
            },
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["confirmation_id"], "c-1");
        assert_eq!(json["response_metadata"]["context_data"]["k"], 1);
    }
}
