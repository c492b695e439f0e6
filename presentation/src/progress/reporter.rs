//! Progress reporting for streaming chat exchanges

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use nurture_application::ChatProgressNotifier;
use nurture_domain::{MessageId, OutgoingEnvelope, RoutingHint};
use std::sync::Mutex;
use std::time::Duration;

/// Shows a spinner with the number of characters received so far
pub struct ProgressReporter {
    spinner: Mutex<Option<Spinner>>,
}

struct Spinner {
    bar: ProgressBar,
    label: &'static str,
    received: usize,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// What the backend is doing, judged from the request.
    pub fn activity_label(request: &OutgoingEnvelope) -> &'static str {
        match request.routing_hint {
            Some(RoutingHint::WebSearch) => "Searching the web",
            Some(RoutingHint::ImageAnalysis) => "Looking at the image",
            None => "Thinking",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatProgressNotifier for ProgressReporter {
    fn on_stream_start(&self, _placeholder: MessageId, request: &OutgoingEnvelope) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        let label = Self::activity_label(request);
        bar.set_prefix(label);
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.spinner.lock()
            && let Some(old) = slot.replace(Spinner {
                bar,
                label,
                received: 0,
            })
        {
            old.bar.finish_and_clear();
        }
    }

    fn on_stream_chunk(&self, chunk: &str) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(spinner) = slot.as_mut()
        {
            spinner.received += chunk.chars().count();
            spinner
                .bar
                .set_message(format!("{} chars", spinner.received));
        }
    }

    fn on_stream_end(&self, _placeholder: MessageId, _success: bool) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(spinner) = slot.take()
        {
            spinner.bar.finish_and_clear();
            tracing::debug!("{} finished after {} chars", spinner.label, spinner.received);
        }
    }

    fn on_upload_start(&self, file_name: &str) {
        eprintln!("{} {}", "Uploading".dimmed(), file_name);
    }
}

/// Simple text-based progress (no spinner)
pub struct SimpleProgress;

impl ChatProgressNotifier for SimpleProgress {
    fn on_stream_start(&self, _placeholder: MessageId, request: &OutgoingEnvelope) {
        eprintln!("{} {}...", "->".cyan(), ProgressReporter::activity_label(request).bold());
    }

    fn on_stream_end(&self, _placeholder: MessageId, success: bool) {
        if !success {
            eprintln!("  {} failed", "x".red());
        }
    }

    fn on_upload_start(&self, file_name: &str) {
        eprintln!("{} Uploading {}", "->".cyan(), file_name);
    }
}
