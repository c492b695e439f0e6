//! Console rendering of conversation messages and chat events

use colored::Colorize;
use nurture_application::{ChatEvent, SendRejection};
use nurture_domain::{ConfirmationRequest, Message, MessageBody, Sender};
use serde_json::Value;

/// Formats chat state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Session banner shown when the REPL starts
    pub fn banner(user_id: &str, base_url: &str) -> String {
        let line = "=".repeat(60);
        format!(
            "{}\n{:^60}\n{}\n{} {}\n{} {}\n",
            line.cyan(),
            "nurture-chat".bold(),
            line.cyan(),
            "Backend:".dimmed(),
            base_url,
            "User:".dimmed(),
            user_id
        )
    }

    /// One conversation message. Streaming placeholders render as nothing.
    pub fn format_message(message: &Message, show_debug: bool) -> String {
        let mut output = match (&message.sender, &message.body) {
            (_, MessageBody::Streaming { .. }) => return String::new(),
            (Sender::User, MessageBody::Image { caption, .. }) => {
                let caption = if caption.is_empty() { "(image)" } else { caption };
                format!("{} {} {}\n", "you>".cyan().bold(), "[image]".magenta(), caption)
            }
            (Sender::User, _) => format!("{} {}\n", "you>".cyan().bold(), message.content()),
            (Sender::Assistant, _) => {
                format!("{}\n{}\n", "assistant>".green().bold(), message.content())
            }
        };

        if let Some(search) = &message.search_data {
            let sources = Self::search_sources(search);
            if !sources.is_empty() {
                output.push_str(&format!("{}\n", "Sources:".cyan().bold()));
                for (title, url) in sources {
                    match url {
                        Some(url) => output.push_str(&format!("  * {} {}\n", title, url.dimmed())),
                        None => output.push_str(&format!("  * {}\n", title)),
                    }
                }
            }
        }

        if show_debug && let Some(debug) = &message.debug_info {
            output.push_str(&format!("{} {}\n", "debug:".dimmed(), debug.to_string().dimmed()));
        }

        output
    }

    /// A pending confirmation with numbered options
    pub fn format_confirmation(request: &ConfirmationRequest) -> String {
        let mut output = format!("\n{} {}\n", "?".yellow().bold(), request.question.bold());
        for (i, option) in request.options.iter().enumerate() {
            output.push_str(&format!("  {} {}\n", format!("{})", i + 1).yellow(), option));
        }
        if let Some(secs) = request.timeout_seconds {
            output.push_str(&format!("{}\n", format!("(answer within {}s)", secs).dimmed()));
        }
        output.push_str(&format!(
            "{}\n",
            "Answer with /answer <number or text>".dimmed()
        ));
        output
    }

    /// Suggested follow-up questions, numbered from 1
    pub fn format_follow_ups(questions: &[String]) -> String {
        let mut output = format!("\n{}\n", "Suggested questions:".cyan().bold());
        for (i, question) in questions.iter().enumerate() {
            output.push_str(&format!("  {} {}\n", format!("[{}]", i + 1).cyan(), question));
        }
        output.push_str(&format!("{}\n", "Ask one with /follow <n>".dimmed()));
        output
    }

    pub fn format_rejection(rejection: SendRejection) -> String {
        let hint = match rejection {
            SendRejection::AwaitingConfirmation => " (use /answer first)",
            SendRejection::InFlight | SendRejection::Empty => "",
        };
        format!("{} {}{}", "Not sent:".yellow().bold(), rejection, hint)
    }

    /// The full conversation, oldest first
    pub fn format_history(messages: &[Message], show_debug: bool) -> String {
        messages
            .iter()
            .map(|m| Self::format_message(m, show_debug))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render an event, or `None` when it needs no output.
    ///
    /// User messages are not echoed; the user just typed them.
    pub fn format_event(event: &ChatEvent, show_debug: bool) -> Option<String> {
        let text = match event {
            ChatEvent::MessageAppended(message) => {
                if message.sender == Sender::User || message.is_streaming() {
                    return None;
                }
                Self::format_message(message, show_debug)
            }
            ChatEvent::MessageReplaced(message) => Self::format_message(message, show_debug),
            ChatEvent::SendRejected(rejection) => Self::format_rejection(*rejection),
            ChatEvent::FollowUpsUpdated(questions) if questions.is_empty() => return None,
            ChatEvent::FollowUpsUpdated(questions) => Self::format_follow_ups(questions),
            ChatEvent::WebSearchChanged { enabled } => {
                let state = if *enabled { "on".green() } else { "off".dimmed() };
                format!("Web search: {}", state)
            }
            ChatEvent::AttachmentSelected {
                file_name,
                width,
                height,
            } => format!(
                "{} {} ({}x{})",
                "Attached:".magenta().bold(),
                file_name,
                width,
                height
            ),
            ChatEvent::AttachmentCleared => format!("{}", "Attachment cleared".dimmed()),
            ChatEvent::AttachmentRejected { reason } => {
                format!("{} {}", "Image not attached:".red().bold(), reason)
            }
            ChatEvent::ConfirmationRequested(request) => Self::format_confirmation(request),
            ChatEvent::ConfirmationResolved { .. } => return None,
            ChatEvent::SessionSaved(id) => format!("{}", format!("saved as {}", id).dimmed()),
            ChatEvent::SessionLoaded { id, title } => {
                format!("{} {} ({})", "Loaded:".cyan().bold(), title, id)
            }
            ChatEvent::SessionReset => format!("{}", "New conversation".cyan().bold()),
            ChatEvent::SessionSaveFailed { error } => {
                format!("{} {}", "Not saved:".yellow().bold(), error)
            }
        };
        Some(text)
    }

    /// `(title, url)` pairs from a search payload.
    ///
    /// Accepts a bare array or an object holding `results` or `sources`;
    /// items without a title fall back to their URL.
    pub fn search_sources(search: &Value) -> Vec<(String, Option<String>)> {
        let items = match search {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("results").or_else(|| map.get("sources")) {
                Some(Value::Array(items)) => items,
                _ => return Vec::new(),
            },
            _ => return Vec::new(),
        };

        items
            .iter()
            .filter_map(|item| {
                let field = |keys: &[&str]| {
                    keys.iter()
                        .find_map(|k| item.get(*k).and_then(Value::as_str))
                        .map(str::to_string)
                };
                let url = field(&["url", "link"]);
                let title = field(&["title", "name"]).or_else(|| url.clone())?;
                Some((title, url))
            })
            .collect()
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
