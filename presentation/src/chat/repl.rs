//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::config::{OutputConfig, ReplConfig};
use colored::Colorize;
use nurture_application::{ChatController, ChatEvent, SendOutcome};
use nurture_domain::{ImageFile, SessionId};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::Path;
use tokio::sync::mpsc;

/// Reads a picked image from a user-supplied path.
pub type ImageOpener = Box<dyn Fn(&str) -> Result<ImageFile, String> + Send + Sync>;

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Send(String),
    /// `None` toggles
    Search(Option<bool>),
    Image(String),
    ClearImage,
    Follow(usize),
    Answer(String),
    New,
    Load(String),
    History,
    Status,
    Help,
    Quit,
    /// A known command with missing or bad arguments
    Usage(&'static str),
    Unknown(String),
}

/// Parse one input line. Empty lines yield `None`.
pub fn parse_line(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(ReplCommand::Send(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    let parsed = match (name, arg) {
        ("quit" | "exit" | "q", _) => ReplCommand::Quit,
        ("help" | "h" | "?", _) => ReplCommand::Help,
        ("search", "") => ReplCommand::Search(None),
        ("search", "on") => ReplCommand::Search(Some(true)),
        ("search", "off") => ReplCommand::Search(Some(false)),
        ("search", _) => ReplCommand::Usage("/search [on|off]"),
        ("image", "") => ReplCommand::Usage("/image <path>"),
        ("image", path) => ReplCommand::Image(path.to_string()),
        ("clear-image", _) => ReplCommand::ClearImage,
        ("follow", n) => match n.parse::<usize>() {
            Ok(n) if n > 0 => ReplCommand::Follow(n),
            _ => ReplCommand::Usage("/follow <n>"),
        },
        ("answer", "") => ReplCommand::Usage("/answer <number or text>"),
        ("answer", choice) => ReplCommand::Answer(choice.to_string()),
        ("new", _) => ReplCommand::New,
        ("load", "") => ReplCommand::Usage("/load <session id>"),
        ("load", id) => ReplCommand::Load(id.to_string()),
        ("history", _) => ReplCommand::History,
        ("status", _) => ReplCommand::Status,
        _ => ReplCommand::Unknown(line.to_string()),
    };
    Some(parsed)
}

/// Map a 1-based option number onto its text; anything else is sent as typed.
pub fn resolve_choice(input: &str, options: &[String]) -> String {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => options[n - 1].clone(),
        _ => input.trim().to_string(),
    }
}

fn help_text() -> String {
    [
        "Commands:",
        "  /search [on|off]   - Toggle web search for the next messages",
        "  /image <path>      - Attach a photo to the next message",
        "  /clear-image       - Drop the attached photo",
        "  /follow <n>        - Ask suggested question n",
        "  /answer <choice>   - Answer the pending confirmation (number or text)",
        "  /new               - Start a new conversation",
        "  /load <id>         - Resume a saved conversation",
        "  /history           - Show the conversation so far",
        "  /status            - Show session and input state",
        "  /help, /h, /?      - Show this help",
        "  /quit, /exit, /q   - Exit chat",
    ]
    .join("\n")
}

/// Interactive chat REPL
pub struct ChatRepl {
    controller: ChatController,
    events: mpsc::UnboundedReceiver<ChatEvent>,
    open_image: ImageOpener,
    output: OutputConfig,
    repl: ReplConfig,
    base_url: String,
}

impl ChatRepl {
    /// `events` must be the receiving end of the controller's event sink.
    pub fn new(
        controller: ChatController,
        events: mpsc::UnboundedReceiver<ChatEvent>,
        open_image: ImageOpener,
    ) -> Self {
        Self {
            controller,
            events,
            open_image,
            output: OutputConfig::default(),
            repl: ReplConfig::default(),
            base_url: String::new(),
        }
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn with_repl_config(mut self, repl: ReplConfig) -> Self {
        self.repl = repl;
        self
    }

    /// Backend shown in the banner
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self.repl.history_file.clone().or_else(|| {
            dirs::data_dir().map(|p| p.join("nurture-chat").join("history.txt"))
        });
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    let Some(command) = parse_line(&line) else {
                        continue;
                    };
                    let _ = rl.add_history_entry(line.trim());
                    if self.execute(command).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            save_history(&mut rl, path);
        }

        Ok(())
    }

    /// Send one message, print the answer and report whether it succeeded.
    pub async fn run_once(&mut self, message: &str) -> bool {
        let outcome = self.controller.send(message).await;
        self.flush_events();
        matches!(outcome, SendOutcome::Completed { .. })
    }

    /// Resume a stored session and print it.
    pub async fn load(&mut self, id: &str) -> bool {
        let id = match SessionId::new(id) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                return false;
            }
        };
        let result = self.controller.load_session(&id).await;
        self.flush_events();
        match result {
            Ok(()) => {
                println!(
                    "{}",
                    ConsoleFormatter::format_history(
                        self.controller.messages(),
                        self.output.show_debug_info
                    )
                );
                true
            }
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                false
            }
        }
    }

    fn prompt(&self) -> String {
        let mode = if self.controller.pending_confirmation().is_some() {
            "[confirm] "
        } else if self.controller.attachment().selected.is_some() {
            "[image] "
        } else if self.controller.web_search_enabled() {
            "[search] "
        } else {
            ""
        };
        format!("{}>>> ", mode)
    }

    fn print_welcome(&self) {
        println!();
        println!(
            "{}",
            ConsoleFormatter::banner(&self.controller.config().user_id, &self.base_url)
        );
        if let Some(seed) = self.controller.messages().first() {
            println!("{}", ConsoleFormatter::format_message(seed, false));
        }
        println!("{}", "Type /help for commands".dimmed());
        println!();
    }

    /// Execute one command. Returns true if the REPL should exit.
    async fn execute(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => println!("\n{}\n", help_text()),
            ReplCommand::Usage(usage) => println!("Usage: {}", usage),
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
            ReplCommand::Send(text) => {
                println!();
                self.controller.send(&text).await;
            }
            ReplCommand::Search(None) => {
                self.controller.toggle_web_search();
            }
            ReplCommand::Search(Some(enabled)) => self.controller.set_web_search(enabled),
            ReplCommand::Image(path) => match (self.open_image)(&path) {
                // Rejections are reported through the event stream
                Ok(file) => {
                    let _ = self.controller.select_image(file, Some(path));
                }
                Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
            },
            ReplCommand::ClearImage => self.controller.clear_attachment(),
            ReplCommand::Follow(n) => {
                println!();
                if let Err(e) = self.controller.follow_up_by_index(n).await {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                }
            }
            ReplCommand::Answer(input) => {
                let choice = match self.controller.pending_confirmation() {
                    Some(request) => resolve_choice(&input, &request.options),
                    None => input,
                };
                if self.controller.confirmation_expired() {
                    println!("{}", "This confirmation may have expired.".dimmed());
                }
                if let Err(e) = self.controller.answer_pending(&choice).await {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                }
            }
            ReplCommand::New => {
                self.controller.new_session();
                self.flush_events();
                if let Some(seed) = self.controller.messages().first() {
                    println!("{}", ConsoleFormatter::format_message(seed, false));
                }
                return false;
            }
            ReplCommand::Load(id) => {
                self.load(&id).await;
                return false;
            }
            ReplCommand::History => println!(
                "{}",
                ConsoleFormatter::format_history(
                    self.controller.messages(),
                    self.output.show_debug_info
                )
            ),
            ReplCommand::Status => self.print_status(),
        }
        self.flush_events();
        false
    }

    fn print_status(&self) {
        let c = &self.controller;
        let session = c
            .session_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "(unsaved)".to_string());
        println!("{} {}", "Session:".cyan().bold(), session);
        println!("{} {}", "Messages:".cyan().bold(), c.messages().len());
        println!(
            "{} {}",
            "Web search:".cyan().bold(),
            if c.web_search_enabled() { "on" } else { "off" }
        );
        let attachment = c
            .attachment()
            .selected
            .as_ref()
            .map(|s| s.file.name.clone())
            .unwrap_or_else(|| "none".to_string());
        println!("{} {}", "Attachment:".cyan().bold(), attachment);
        println!(
            "{} {}",
            "Confirmation:".cyan().bold(),
            c.confirmation_state().label()
        );
    }

    /// Print everything the controller emitted since the last flush.
    fn flush_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if let Some(text) = ConsoleFormatter::format_event(&event, self.output.show_debug_info)
            {
                println!("{}", text);
            }
        }
    }
}

fn save_history(rl: &mut DefaultEditor, path: &Path) {
    if let Err(e) = rl.save_history(path) {
        tracing::debug!("Could not save history to {}: {}", path.display(), e);
    }
}
