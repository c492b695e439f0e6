//! Reading picked image files from disk.

use nurture_domain::ImageFile;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Normalize a path typed or pasted into the prompt.
///
/// Strips surrounding quotes, undoes drag-and-drop shell escaping (`\ `,
/// `\(`, `\)`) and expands `~/`.
pub fn normalize_input_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);
    let unescaped = unquoted
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    if let Some(rest) = unescaped.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(unescaped)
}

/// MIME type for the supported image extensions.
pub fn mime_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Content sniffing first, extension second.
fn detect_mime(path: &Path, bytes: &[u8]) -> String {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .or_else(|| mime_type_for_extension(path))
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}

/// Read `path` into an [`ImageFile`].
///
/// Non-image files load fine and carry their detected MIME type; rejecting
/// them is up to the attachment pipeline.
pub fn load_image_file(path: &Path) -> Result<ImageFile, ImageLoadError> {
    let bytes = std::fs::read(path).map_err(|source| ImageLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = detect_mime(path, &bytes);
    Ok(ImageFile::new(name, mime, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_sniffed_type_wins_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("misnamed.jpg");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let file = load_image_file(&path).unwrap();
        assert_eq!(file.name, "misnamed.jpg");
        assert_eq!(file.mime_type, "image/png");
        assert!(file.is_image());
    }

    #[test]
    fn test_extension_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.WEBP");
        std::fs::write(&path, b"??").unwrap();
        assert_eq!(load_image_file(&path).unwrap().mime_type, "image/webp");
    }

    #[test]
    fn test_unknown_file_is_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();
        let file = load_image_file(&path).unwrap();
        assert!(!file.is_image());
    }

    #[test]
    fn test_missing_file() {
        let err = load_image_file(Path::new("/nonexistent/photo.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/photo.png"));
    }

    #[test]
    fn test_normalize_input_path() {
        assert_eq!(
            normalize_input_path("/tmp/my\\ photo\\ \\(1\\).png"),
            PathBuf::from("/tmp/my photo (1).png")
        );
        assert_eq!(
            normalize_input_path("  '/tmp/a b.png' "),
            PathBuf::from("/tmp/a b.png")
        );
        assert_eq!(normalize_input_path("\"x.png\""), PathBuf::from("x.png"));
    }
}
