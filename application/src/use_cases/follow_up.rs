//! Follow-up question handler.
//!
//! Holds the suggested questions of the latest completed response. The list
//! is replaced on every completion and cleared on error or when one of its
//! questions is sent.

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FollowUpHandler {
    questions: Vec<String>,
    submitting: bool,
}

impl FollowUpHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set(&mut self, questions: Vec<String>) {
        self.questions = questions;
    }

    pub fn clear(&mut self) {
        self.questions.clear();
    }

    /// The question at 1-based `position`, as shown to the user.
    pub fn question(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.questions.get(i))
            .map(String::as_str)
    }

    /// Claim the submission slot. `false` while another click is being sent.
    pub fn begin_click(&mut self) -> bool {
        if self.submitting {
            debug!("Follow-up click ignored, already submitting");
            return false;
        }
        self.submitting = true;
        true
    }

    /// Release the submission slot. The list is cleared when the send went out.
    pub fn end_click(&mut self, sent: bool) {
        self.submitting = false;
        if sent {
            self.questions.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> FollowUpHandler {
        let mut handler = FollowUpHandler::new();
        handler.set(vec!["離乳食はいつから？".to_string(), "量の目安は？".to_string()]);
        handler
    }

    #[test]
    fn test_question_is_one_based() {
        let handler = handler();
        assert_eq!(handler.question(1), Some("離乳食はいつから？"));
        assert_eq!(handler.question(2), Some("量の目安は？"));
        assert_eq!(handler.question(0), None);
        assert_eq!(handler.question(3), None);
    }

    #[test]
    fn test_click_guard() {
        let mut handler = handler();
        assert!(handler.begin_click());
        assert!(!handler.begin_click());
        handler.end_click(true);
        assert!(!handler.is_submitting());
        assert!(handler.questions().is_empty());
    }

    #[test]
    fn test_rejected_click_keeps_list() {
        let mut handler = handler();
        assert!(handler.begin_click());
        handler.end_click(false);
        assert_eq!(handler.questions().len(), 2);
        assert!(handler.begin_click());
    }
}
