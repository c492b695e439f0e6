//! Use cases (application services)
//!
//! - [`session_state::SessionState`]: the message list and session identity
//! - [`dispatcher::StreamingDispatcher`]: one streaming exchange at a time
//! - [`confirmation::ConfirmationHandler`]: the confirmation sub-protocol
//! - [`follow_up::FollowUpHandler`]: suggested questions
//! - [`attachment::AttachmentPipeline`]: image validation, preview and upload
//! - [`chat_controller::ChatController`]: facade wiring all of the above to the ports

pub mod attachment;
pub mod chat_controller;
pub mod confirmation;
pub mod dispatcher;
pub mod follow_up;
pub mod session_state;
