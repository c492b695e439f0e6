//! Upload receipts and server path derivation

use serde::{Deserialize, Serialize};
use url::Url;

const RELATIVE_BASE: &str = "http://localhost/";

/// Reply of the upload collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Map a returned file URL to the path the backend reads it from.
///
/// Takes the last segment of the URL path (dropping query and fragment) and
/// places it under `upload_dir`. Relative URLs are resolved against a dummy
/// origin. Returns `None` when no file name is present.
pub fn server_path_from_url(file_url: &str, upload_dir: &str) -> Option<String> {
    let url = Url::parse(file_url)
        .or_else(|_| Url::parse(RELATIVE_BASE).and_then(|base| base.join(file_url)))
        .ok()?;
    let file_name = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()?;
    Some(format!("{}/{}", upload_dir.trim_end_matches('/'), file_name))
}
