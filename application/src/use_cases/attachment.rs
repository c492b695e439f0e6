//! Attachment pipeline.
//!
//! Owns the [`Composer`] (web-search flag and attachment slot) and drives
//! image selection, preview generation and upload through the
//! [`ImageProcessor`] and [`AttachmentUploader`] ports.

use crate::config::AttachmentLimits;
use crate::ports::attachment_uploader::AttachmentUploader;
use crate::ports::image_processor::{ImageProcessingError, ImageProcessor};
use nurture_domain::{
    AttachmentState, Composer, DomainError, ImageFile, SelectedImage, server_path_from_url,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why an image could not be attached. Never fatal; the slot is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Processing(#[from] ImageProcessingError),
}

pub struct AttachmentPipeline {
    processor: Arc<dyn ImageProcessor>,
    uploader: Arc<dyn AttachmentUploader>,
    limits: AttachmentLimits,
    composer: Composer,
}

impl AttachmentPipeline {
    pub fn new(
        processor: Arc<dyn ImageProcessor>,
        uploader: Arc<dyn AttachmentUploader>,
        limits: AttachmentLimits,
    ) -> Self {
        Self {
            processor,
            uploader,
            limits,
            composer: Composer::default(),
        }
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn attachment(&self) -> &AttachmentState {
        self.composer.attachment()
    }

    pub fn web_search_enabled(&self) -> bool {
        self.composer.web_search_enabled()
    }

    /// Validate `file`, build its preview and make it the attachment.
    ///
    /// On error nothing changes, including web-search mode.
    pub fn select_image(
        &mut self,
        file: ImageFile,
        input_value: Option<String>,
    ) -> Result<&AttachmentState, AttachmentError> {
        file.ensure_image()?;
        let preview = self.processor.prepare_preview(&file, &self.limits)?;
        info!(
            "Image attached: {} ({}x{})",
            file.name, preview.width, preview.height
        );
        Ok(self
            .composer
            .attach(SelectedImage { file, preview }, input_value))
    }

    /// Where the backend can read the attachment from.
    ///
    /// Uploads the file and derives the server path from the returned URL.
    /// Any failure falls back to the local preview data URL. `None` only when
    /// nothing is attached.
    pub async fn resolve_remote_path(&mut self, user_id: &str) -> Option<String> {
        let selected = self.composer.attachment().selected.as_ref()?;
        if let Some(path) = &self.composer.attachment().resolved_remote_path {
            return Some(path.clone());
        }
        let fallback = selected.preview.data_url.clone();

        let path = match self.uploader.upload(&selected.file, user_id).await {
            Ok(receipt) if receipt.success => {
                let derived = receipt
                    .file_url
                    .as_deref()
                    .and_then(|url| server_path_from_url(url, &self.limits.server_upload_dir));
                match derived {
                    Some(path) => {
                        debug!("Upload resolved to {}", path);
                        path
                    }
                    None => {
                        warn!("Upload succeeded without a usable file URL, using preview");
                        fallback
                    }
                }
            }
            Ok(_) => {
                warn!("Upload reported failure, using preview");
                fallback
            }
            Err(e) => {
                warn!("Upload failed, using preview: {}", e);
                fallback
            }
        };

        self.composer.set_resolved_remote_path(path.clone());
        Some(path)
    }

    /// Reset file, preview, resolved path and the file-input value.
    pub fn clear(&mut self) {
        self.composer.clear_attachment();
    }

    /// Enabling web search drops the attachment.
    pub fn set_web_search(&mut self, enabled: bool) {
        self.composer.set_web_search(enabled);
    }

    pub fn toggle_web_search(&mut self) -> bool {
        self.composer.toggle_web_search()
    }
}
