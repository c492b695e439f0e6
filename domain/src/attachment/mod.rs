//! Image attachment domain.
//!
//! - [`entities::ImageFile`]: a user-selected file (bytes + MIME)
//! - [`entities::AttachmentState`]: selection, preview and resolved remote path
//! - [`composer::Composer`]: input modes; an attachment and web-search mode exclude each other
//! - [`upload`]: upload receipts and server path derivation

pub mod composer;
pub mod entities;
pub mod upload;
