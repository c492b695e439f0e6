//! Confirmation answers over HTTP

use super::client::BackendClient;
use async_trait::async_trait;
use nurture_application::{ConfirmationError, ConfirmationGateway};
use nurture_domain::{ConfirmationAnswer, ConfirmationReply};
use tracing::debug;

const RESPOND_PATH: &str = "/api/confirmation/respond";

/// [`ConfirmationGateway`] posting to the backend's confirmation endpoint
pub struct HttpConfirmationGateway {
    client: BackendClient,
}

impl HttpConfirmationGateway {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfirmationGateway for HttpConfirmationGateway {
    async fn submit(&self, answer: &ConfirmationAnswer) -> Result<ConfirmationReply, ConfirmationError> {
        debug!("Posting answer for confirmation {}", answer.confirmation_id);
        let reply: ConfirmationReply = self.client.post_json(RESPOND_PATH, answer).await?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use nurture_domain::{
        ActionType, ConfirmationAnswer, ConfirmationId, ConfirmationReply, ResponseMetadata,
        SessionId,
    };
    use serde_json::json;

    #[test]
    fn test_answer_wire_format() {
        let answer = ConfirmationAnswer {
            confirmation_id: ConfirmationId::new("c-1"),
            user_response: "はい".to_string(),
            user_id: "u1".to_string(),
            session_id: Some(SessionId::new("s-1").unwrap()),
            response_metadata: ResponseMetadata {
                context_data: json!({"record_type": "sleep"}),
            },
        };
        assert_eq!(
            serde_json::to_value(&answer).unwrap(),
            json!({
                "confirmation_id": "c-1",
                "user_response": "はい",
                "user_id": "u1",
                "session_id": "s-1",
                "response_metadata": {"context_data": {"record_type": "sleep"}},
            })
        );
    }

    #[test]
    fn test_reply_parsing_is_lenient() {
        let reply: ConfirmationReply =
            serde_json::from_value(json!({"followup_action": {"action_type": "reschedule"}}))
                .unwrap();
        assert_eq!(reply.message, "");
        assert_eq!(reply.followup_action.unwrap().action_type, ActionType::Other);

        let reply: ConfirmationReply = serde_json::from_value(json!({
            "message": "記録しました",
            "followup_action": {"action_type": "proceed"},
        }))
        .unwrap();
        assert_eq!(reply.followup_action.unwrap().action_type, ActionType::Proceed);
    }
}
