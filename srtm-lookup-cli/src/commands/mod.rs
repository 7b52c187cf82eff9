pub mod auth;
pub mod list;
pub mod lookup;
pub mod prefetch;
pub mod tile;

use indicatif::{ProgressBar, ProgressStyle};
use srtm_lookup::{CancelToken, LookupState, ProgressSink};

/// Progress bar counting tiles.
pub struct TileProgress {
    bar: ProgressBar,
}

impl TileProgress {
    pub fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles {msg}",
                )?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for TileProgress {
    fn progress(&mut self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }

    fn state_changed(&mut self, state: LookupState) {
        let message = match state {
            LookupState::FetchingTile(_) => "fetching",
            LookupState::Applying(_) => "applying",
            LookupState::Cancelled => "cancelled",
            _ => "",
        };
        self.bar.set_message(message);
    }
}

/// Cancel token triggered by Ctrl-C.
pub fn ctrl_c_token() -> anyhow::Result<CancelToken> {
    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!("Cancelling after the current tile...");
        handler_token.cancel();
    })?;
    Ok(token)
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
