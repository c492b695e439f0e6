//! Backend configuration from TOML (`[backend]` section)

use serde::{Deserialize, Serialize};

/// Raw backend configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Base URL of the chat backend (no trailing `/api`)
    pub base_url: String,
    /// Whole-request timeout for non-streaming calls
    pub timeout_seconds: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 60,
        }
    }
}
