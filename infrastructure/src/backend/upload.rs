//! Image uploads over HTTP (multipart)

use super::client::BackendClient;
use super::error::BackendError;
use async_trait::async_trait;
use nurture_application::{AttachmentUploader, UploadError};
use nurture_domain::{ImageFile, UploadReceipt};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

const UPLOAD_PATH: &str = "/api/upload/image";

/// [`AttachmentUploader`] posting `file` and `user_id` as a multipart form
pub struct HttpAttachmentUploader {
    client: BackendClient,
}

impl HttpAttachmentUploader {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn form(file: &ImageFile, user_id: &str) -> Result<Form, BackendError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
        Ok(Form::new()
            .part("file", part)
            .text("user_id", user_id.to_string()))
    }
}

#[async_trait]
impl AttachmentUploader for HttpAttachmentUploader {
    async fn upload(&self, file: &ImageFile, user_id: &str) -> Result<UploadReceipt, UploadError> {
        debug!("Uploading {} ({} bytes)", file.name, file.bytes.len());
        let form = Self::form(file, user_id)?;
        let receipt: UploadReceipt = self.client.post_multipart(UPLOAD_PATH, form).await?;
        info!(
            "Upload finished (success: {}, url: {:?})",
            receipt.success, receipt.file_url
        );
        Ok(receipt)
    }
}
