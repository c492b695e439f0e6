//! Assistant response handling.
//!
//! - [`chat_response::ChatResponse`]: terminal payload of a streamed answer
//! - [`cleanup::clean`]: strips follow-up sections and marker lines for display
//! - [`follow_up::extract_follow_up_questions`]: recovers suggested questions from text
//! - [`stream::StreamEvent`]: chunks and the terminal event of a streamed answer

pub mod chat_response;
pub mod cleanup;
pub mod follow_up;
pub mod stream;
