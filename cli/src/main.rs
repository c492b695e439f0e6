//! CLI entrypoint for nurture-chat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use nurture_application::{ChatController, ChatProgressNotifier, SessionGateway};
use nurture_infrastructure::{
    BackendClient, ConfigLoader, FileConfig, HttpAttachmentUploader, HttpChatTransport,
    HttpConfirmationGateway, HttpSessionGateway, InMemorySessionGateway,
    JsonlConversationLogger, RasterImageProcessor, Severity, expand_home, load_image_file,
    normalize_input_path,
};
use nurture_presentation::{
    ChatRepl, Cli, ImageOpener, OutputConfig, ProgressReporter, ReplConfig, SimpleProgress,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Log filter for the `-v` count
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Warning => warn!("Config: {}", issue),
            Severity::Error => eprintln!("Config error: {}", issue),
        }
    }
    if FileConfig::has_errors(&issues) {
        bail!("Invalid configuration");
    }
    Ok(config)
}

fn progress_for(cli: &Cli, config: &FileConfig) -> Option<Arc<dyn ChatProgressNotifier>> {
    if cli.quiet {
        return None;
    }
    let progress: Arc<dyn ChatProgressNotifier> = if config.repl.show_progress {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };
    Some(progress)
}

fn image_opener() -> ImageOpener {
    Box::new(|input: &str| {
        let path = normalize_input_path(input);
        load_image_file(&path).map_err(|e| e.to_string())
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter(cli.verbose)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = load_config(&cli)?;
    if !config.output.color {
        colored::control::set_override(false);
    }
    info!("Starting nurture-chat against {}", config.base_url());

    // === Dependency Injection ===
    let client = BackendClient::new(config.base_url(), config.request_timeout())
        .context("Failed to create HTTP client")?;
    let chat_config = config.to_chat_config();

    let sessions: Arc<dyn SessionGateway> = if cli.offline {
        info!("Offline mode: sessions are kept in memory");
        Arc::new(InMemorySessionGateway::new())
    } else {
        Arc::new(HttpSessionGateway::new(
            client.clone(),
            chat_config.user_id.clone(),
        ))
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut controller = ChatController::new(
        chat_config,
        Arc::new(HttpChatTransport::new(client.clone())),
        Arc::new(HttpConfirmationGateway::new(client.clone())),
        sessions,
        Arc::new(RasterImageProcessor::new()),
        Arc::new(HttpAttachmentUploader::new(client)),
    )
    .with_event_sink(event_tx);

    if let Some(progress) = progress_for(&cli, &config) {
        controller = controller.with_progress(progress);
    }

    if let Some(path) = &config.logging.conversation_log {
        let path = expand_home(path);
        match JsonlConversationLogger::new(&path) {
            Some(logger) => {
                info!("Conversation log: {}", logger.path().display());
                controller = controller.with_conversation_logger(Arc::new(logger));
            }
            None => warn!("Conversation log disabled"),
        }
    }

    let mut repl = ChatRepl::new(controller, event_rx, image_opener())
        .with_output(OutputConfig {
            color: config.output.color,
            show_debug_info: config.output.show_debug_info,
        })
        .with_repl_config(ReplConfig {
            show_progress: config.repl.show_progress,
            history_file: config
                .repl
                .history_file
                .as_deref()
                .map(expand_home)
                .or_else(ConfigLoader::default_history_path),
        })
        .with_base_url(config.base_url());

    if let Some(id) = &cli.session
        && !repl.load(id).await
    {
        bail!("Could not load session {}", id);
    }

    // Single message mode
    if let Some(message) = &cli.message {
        if !repl.run_once(message).await {
            bail!("No answer received");
        }
        return Ok(());
    }

    repl.run().await?;
    Ok(())
}
