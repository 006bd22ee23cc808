//! Terminal progress display for downloads
//!
//! [`TerminalProgress`] draws an indicatif bar per transfer. When stderr is not
//! a terminal it falls back to log lines at the start and end of each transfer.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::app::ProgressSink;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg:24!} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {bytes_per_sec}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg:24!} {bytes} {bytes_per_sec}";

#[derive(Default)]
struct Transfer {
    title: String,
    written: u64,
    bar: Option<ProgressBar>,
}

/// Progress sink for the command line
pub struct TerminalProgress {
    is_terminal: bool,
    current: Mutex<Transfer>,
}

impl TerminalProgress {
    /// Draw bars when stderr is a terminal
    pub fn new() -> Self {
        Self::with_terminal(atty::is(atty::Stream::Stderr))
    }

    /// Force bar (`true`) or text (`false`) mode
    pub fn with_terminal(is_terminal: bool) -> Self {
        Self {
            is_terminal,
            current: Mutex::new(Transfer::default()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    fn create_bar(title: &str, total: Option<u64>) -> ProgressBar {
        let (bar, template) = match total {
            Some(total) if total > 0 => (ProgressBar::new(total), BAR_TEMPLATE),
            _ => (ProgressBar::new_spinner(), SPINNER_TEMPLATE),
        };
        let style = ProgressStyle::default_bar()
            .template(template)
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(title.to_string());
        bar
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn start(&self, title: &str, total: Option<u64>) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        if let Some(previous) = current.bar.take() {
            previous.finish_and_clear();
        }

        current.title = title.to_string();
        current.written = 0;
        if self.is_terminal {
            current.bar = Some(Self::create_bar(title, total));
        } else {
            match total {
                Some(total) => info!("Downloading {} ({} bytes)", title, total),
                None => info!("Downloading {}", title),
            }
        }
    }

    fn update(&self, written: u64) {
        if let Ok(mut current) = self.current.lock() {
            current.written = written;
            if let Some(ref bar) = current.bar {
                bar.set_position(written);
            }
        }
    }

    fn finish(&self) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        match current.bar.take() {
            Some(bar) => bar.finish_and_clear(),
            None => debug!("Finished {} ({} bytes)", current.title, current.written),
        }
    }
}
