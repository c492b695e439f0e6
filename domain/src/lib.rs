//! Domain layer for nurture-chat
//!
//! This crate contains the entities and value objects of a client-side chat
//! session against a streaming parenting-support assistant. It has no
//! dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Messages
//!
//! The conversation is an ordered list of [`Message`]s. While an answer is
//! streaming, a single placeholder message carries the outgoing request in
//! its body ([`MessageBody::Streaming`]); on completion it becomes text.
//!
//! ## Confirmations
//!
//! A response may embed a [`ConfirmationRequest`]. Until it is answered the
//! session is locked for new submissions.
//!
//! ## Input modes
//!
//! The [`Composer`] holds web-search mode and the image attachment, which
//! exclude each other. Either one adds a [`RoutingHint`] to the request.

pub mod attachment;
pub mod confirmation;
pub mod core;
pub mod envelope;
pub mod message;
pub mod response;
pub mod session;

// Re-export commonly used types
pub use attachment::{
    composer::Composer,
    entities::{AttachmentState, ImageFile, ImagePreview, SelectedImage},
    upload::{UploadReceipt, server_path_from_url},
};
pub use confirmation::{
    entities::{
        ActionType, ConfirmationAnswer, ConfirmationId, ConfirmationReply, ConfirmationRequest,
        FollowupAction, ResponseMetadata,
    },
    state::ConfirmationState,
};
pub use core::error::DomainError;
pub use envelope::{
    entities::{HistoryEntry, MultimodalContext, OutgoingEnvelope},
    routing::{IMAGE_ANALYSIS_DIRECTIVE_HEADER, RoutingHint, WEB_SEARCH_DIRECTIVE_HEADER},
};
pub use message::entities::{Message, MessageBody, MessageId, MessageKind, Sender};
pub use response::{
    chat_response::ChatResponse, cleanup::clean, follow_up::extract_follow_up_questions,
    stream::StreamEvent,
};
pub use session::entities::{Session, SessionId, derive_title};
