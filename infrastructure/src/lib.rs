//! Infrastructure layer for nurture-chat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the HTTP backend (SSE chat stream,
//! confirmations, uploads, sessions), raster image processing, the
//! JSONL transcript, and configuration file loading.

pub mod backend;
pub mod config;
pub mod image;
pub mod logging;

// Re-export commonly used types
pub use backend::{
    BackendClient, BackendError, HttpAttachmentUploader, HttpChatTransport,
    HttpConfirmationGateway, HttpSessionGateway, InMemorySessionGateway,
};
pub use config::{ConfigIssue, ConfigLoader, FileConfig, Severity, expand_home};
pub use image::{ImageLoadError, RasterImageProcessor, load_image_file, normalize_input_path};
pub use logging::JsonlConversationLogger;
