//! Confirmation sub-protocol domain.
//!
//! A response can ask the user to choose before the conversation continues.
//!
//! ```text
//! NONE ──(response carries a request)──▶ AWAITING
//! AWAITING ──answer()──▶ RESOLVING ──(reply or failure)──▶ NONE
//! ```
//!
//! - [`entities::ConfirmationRequest`]: the question, its options and opaque context
//! - [`entities::ConfirmationAnswer`]: what is posted back
//! - [`state::ConfirmationState`]: where the exchange currently stands

pub mod entities;
pub mod state;
