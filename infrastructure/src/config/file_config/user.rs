//! User configuration from TOML (`[user]` section)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw user configuration from TOML
///
/// `family_info` is free-form and forwarded to the backend as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileUserConfig {
    pub user_id: String,
    pub family_info: Value,
}

impl Default for FileUserConfig {
    fn default() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            family_info: Value::Object(Default::default()),
        }
    }
}
