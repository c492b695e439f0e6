//! Image processing port
//!
//! Turns a selected image into a bounded, re-encoded preview. The raster
//! work lives in infrastructure; the pipeline only sees the result.

use crate::config::AttachmentLimits;
use nurture_domain::{ImageFile, ImagePreview};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageProcessingError {
    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Could not encode preview: {0}")]
    Encode(String),
}

/// Resizes and re-encodes images
pub trait ImageProcessor: Send + Sync {
    /// Resize within `limits` keeping the aspect ratio, re-encode, and
    /// return the preview.
    fn prepare_preview(
        &self,
        file: &ImageFile,
        limits: &AttachmentLimits,
    ) -> Result<ImagePreview, ImageProcessingError>;
}
