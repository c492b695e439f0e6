//! Application layer for nurture-chat
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AttachmentLimits, ChatConfig, ChatMessages};
pub use ports::{
    attachment_uploader::{AttachmentUploader, UploadError},
    chat_event::ChatEvent,
    chat_transport::{ChatTransport, StreamHandle, TransportError},
    confirmation_gateway::{ConfirmationError, ConfirmationGateway},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    image_processor::{ImageProcessingError, ImageProcessor},
    progress::{ChatProgressNotifier, NoChatProgress},
    session_gateway::{PersistenceError, SessionGateway},
};
pub use use_cases::attachment::{AttachmentError, AttachmentPipeline};
pub use use_cases::chat_controller::{ChatController, ChatError, SendOutcome};
pub use use_cases::confirmation::{AnswerOutcome, ConfirmationHandler};
pub use use_cases::dispatcher::{
    Dispatch, DispatchSettings, DispatchTicket, OutgoingImage, SendRejection, SendRequest,
    StreamingDispatcher,
};
pub use use_cases::follow_up::FollowUpHandler;
pub use use_cases::session_state::{SessionState, StateError};
