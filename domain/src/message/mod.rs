//! Chat message domain.
//!
//! - [`entities::Message`]: a single entry in the conversation list
//! - [`entities::MessageBody`]: text body or in-flight streaming request
//! - [`entities::MessageId`]: client-generated message identifier

pub mod entities;
