//! Chat session domain.
//!
//! - [`entities::Session`]: a persisted conversation (id, title, messages)
//! - [`entities::SessionId`]: backend-assigned session identifier

pub mod entities;
