//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface.

mod repl;

pub use repl::{ChatRepl, ImageOpener, ReplCommand, parse_line, resolve_choice};
