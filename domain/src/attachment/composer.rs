//! Input surface modes

use super::entities::{AttachmentState, SelectedImage};

/// Input modes of the chat surface.
///
/// Web-search mode and an attached image are mutually exclusive: turning
/// one on clears the other, so both are never true at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    web_search: bool,
    attachment: AttachmentState,
}

impl Composer {
    pub fn web_search_enabled(&self) -> bool {
        self.web_search
    }

    pub fn attachment(&self) -> &AttachmentState {
        &self.attachment
    }

    pub fn has_attachment(&self) -> bool {
        !self.attachment.is_empty()
    }

    /// Attach an image, turning web-search mode off.
    pub fn attach(&mut self, image: SelectedImage, input_value: Option<String>) -> &AttachmentState {
        self.web_search = false;
        self.attachment = AttachmentState {
            selected: Some(image),
            resolved_remote_path: None,
            file_input_value: input_value,
        };
        &self.attachment
    }

    pub fn set_resolved_remote_path(&mut self, path: String) {
        if self.has_attachment() {
            self.attachment.resolved_remote_path = Some(path);
        }
    }

    /// Reset file, preview, resolved path and the file-input value.
    pub fn clear_attachment(&mut self) {
        self.attachment = AttachmentState::default();
    }

    /// Enable or disable web-search mode; enabling drops any attachment.
    pub fn set_web_search(&mut self, enabled: bool) {
        if enabled {
            self.clear_attachment();
        }
        self.web_search = enabled;
    }

    pub fn toggle_web_search(&mut self) -> bool {
        self.set_web_search(!self.web_search);
        self.web_search
    }
}
