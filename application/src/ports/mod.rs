//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement,
//! plus the output port ([`chat_event`]) the presentation layer consumes.

pub mod attachment_uploader;
pub mod chat_event;
pub mod chat_transport;
pub mod confirmation_gateway;
pub mod conversation_logger;
pub mod image_processor;
pub mod progress;
pub mod session_gateway;
