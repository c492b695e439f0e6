//! Attachment upload port

use async_trait::async_trait;
use nurture_domain::{ImageFile, UploadReceipt};
use thiserror::Error;

/// Upload failures. Callers fall back to the local preview on any of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Upload failed: {0}")]
    RequestFailed(String),

    #[error("Upload rejected: {0}")]
    Rejected(String),
}

/// Uploads an attached image for the backend to read
#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    async fn upload(&self, file: &ImageFile, user_id: &str) -> Result<UploadReceipt, UploadError>;
}
