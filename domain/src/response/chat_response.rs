//! Terminal payload of a streamed chat answer

use super::cleanup::clean;
use super::follow_up::{extract_follow_up_questions, normalize_questions};
use crate::confirmation::entities::ConfirmationRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the backend sends when a stream completes.
///
/// Every field besides the text is optional and parsed leniently:
/// a malformed extra is treated as absent rather than failing the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, alias = "content")]
    pub response: String,
    #[serde(default)]
    pub confirmation_data: Option<Value>,
    #[serde(default)]
    pub search_data: Option<Value>,
    #[serde(default)]
    pub follow_up_questions: Option<Value>,
    #[serde(default)]
    pub debug_info: Option<Value>,
}

impl ChatResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
            ..Default::default()
        }
    }

    pub fn with_confirmation(mut self, payload: Value) -> Self {
        self.confirmation_data = Some(payload);
        self
    }

    pub fn with_follow_ups(mut self, questions: &[&str]) -> Self {
        self.follow_up_questions = Some(Value::from(questions.to_vec()));
        self
    }

    /// Response text ready for display.
    pub fn cleaned_text(&self) -> String {
        clean(&self.response)
    }

    pub fn confirmation_request(&self) -> Option<ConfirmationRequest> {
        self.confirmation_data
            .as_ref()
            .and_then(ConfirmationRequest::from_payload)
    }

    pub fn search_data(&self) -> Option<Value> {
        self.search_data.clone().filter(|v| !v.is_null())
    }

    pub fn debug_info(&self) -> Option<Value> {
        self.debug_info.clone().filter(|v| !v.is_null())
    }

    /// Suggested questions: the explicit list when the backend sent one,
    /// otherwise whatever the raw text offers.
    pub fn follow_up_questions(&self) -> Vec<String> {
        let explicit = self
            .follow_up_questions
            .as_ref()
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .map(normalize_questions)
            .filter(|questions| !questions.is_empty());

        explicit.unwrap_or_else(|| extract_follow_up_questions(&self.response))
    }
}
