//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for nurture-chat
#[derive(Parser, Debug)]
#[command(name = "nurture-chat")]
#[command(author, version, about = "Terminal client for a streaming parenting-support assistant")]
#[command(long_about = r#"
nurture-chat talks to a parenting-support chat backend. Answers stream in as
they are generated; the assistant may ask you to confirm an action, suggest
follow-up questions, search the web or look at a photo you attach.

Configuration files are loaded from (in priority order):
1. NURTURE_* environment variables (e.g. NURTURE_BACKEND__BASE_URL)
2. --config <path>     Explicit config file
3. ./nurture.toml      Project-level config
4. ~/.config/nurture-chat/config.toml   Global config

Example:
  nurture-chat
  nurture-chat "夜泣きが続いています。どうしたらいいですか？"
  nurture-chat --session 3f2c9a --offline
"#)]
pub struct Cli {
    /// Send a single message, print the answer and exit
    pub message: Option<String>,

    /// Resume a saved session by id
    #[arg(short, long, value_name = "ID")]
    pub session: Option<String>,

    /// Keep sessions in memory instead of saving them to the backend
    #[arg(long)]
    pub offline: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
