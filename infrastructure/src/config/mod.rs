//! Configuration file loading for nurture-chat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `NURTURE_` environment variables (`NURTURE_BACKEND__BASE_URL=...`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./nurture.toml` or `./.nurture.toml`
//! 4. Global: `$XDG_CONFIG_HOME/nurture-chat/config.toml`
//!    (`~/.config/nurture-chat/config.toml` when unset)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileAttachmentsConfig, FileBackendConfig, FileChatConfig, FileConfig,
    FileLoggingConfig, FileOutputConfig, FileReplConfig, FileUserConfig, Severity,
};
pub use loader::{ConfigLoader, expand_home};
