//! Image handling for attachments
//!
//! [`RasterImageProcessor`] implements the application's `ImageProcessor`
//! port with the `image` crate; [`load_image_file`] reads a picked file from
//! disk and works out its MIME type.

mod loader;
mod processor;

pub use loader::{ImageLoadError, load_image_file, mime_type_for_extension, normalize_input_path};
pub use processor::RasterImageProcessor;
