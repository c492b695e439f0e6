//! Attachment entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A file the user picked for attachment
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    /// Reject anything that is not an image.
    pub fn ensure_image(&self) -> Result<(), DomainError> {
        if self.is_image() {
            Ok(())
        } else {
            Err(DomainError::InvalidImageType(self.mime_type.clone()))
        }
    }
}

/// Resized, re-encoded representation used for display and as upload fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePreview {
    /// `data:<mime>;base64,...`
    pub data_url: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// A validated image together with its preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub file: ImageFile,
    pub preview: ImagePreview,
}

/// Attachment slot of the input surface.
///
/// Holds at most one image. The default value is the empty slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentState {
    pub selected: Option<SelectedImage>,
    pub resolved_remote_path: Option<String>,
    /// What the file picker currently shows (a local path in the terminal UI).
    pub file_input_value: Option<String>,
}

impl AttachmentState {
    pub fn is_empty(&self) -> bool {
        self.selected.is_none()
    }

    pub fn preview(&self) -> Option<&ImagePreview> {
        self.selected.as_ref().map(|s| &s.preview)
    }

    pub fn file(&self) -> Option<&ImageFile> {
        self.selected.as_ref().map(|s| &s.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image() {
        assert!(ImageFile::new("a.png", "image/png", vec![]).is_image());
        assert!(ImageFile::new("a.jpg", " IMAGE/JPEG", vec![]).is_image());
        assert!(!ImageFile::new("a.pdf", "application/pdf", vec![]).is_image());
        assert!(!ImageFile::new("a", "", vec![]).is_image());
    }

    #[test]
    fn test_ensure_image_error() {
        let err = ImageFile::new("a.txt", "text/plain", vec![]).ensure_image().unwrap_err();
        assert_eq!(err, DomainError::InvalidImageType("text/plain".into()));
    }

    #[test]
    fn test_debug_hides_bytes() {
        let file = ImageFile::new("a.png", "image/png", vec![1, 2, 3]);
        let debug = format!("{file:?}");
        assert!(debug.contains("len: 3"));
    }

    #[test]
    fn test_default_state_is_empty() {
        let state = AttachmentState::default();
        assert!(state.is_empty());
        assert!(state.preview().is_none());
    }
}
