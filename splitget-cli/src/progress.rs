//! Terminal progress bar fed by the library's progress callback.

use std::time::Duration;

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use splitget::transfer::TransferProgressCallback;

const BAR_TEMPLATE: &str =
    "{prefix:.cyan.bold} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const SPINNER_TEMPLATE: &str = "{spinner:.green} {prefix:.cyan.bold} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {msg}";

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Progress display for one download.
///
/// Starts as a spinner; switches to a bar once the total size is known.
pub struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new_spinner().with_style(style(SPINNER_TEMPLATE));
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Callback to hand to the downloader.
    pub fn callback(&self) -> TransferProgressCallback {
        let bar = self.bar.clone();
        Box::new(move |bytes, total, completed, chunks| {
            if let Some(total) = total {
                if bar.length() != Some(total) {
                    bar.set_length(total);
                    bar.set_style(style(BAR_TEMPLATE));
                }
            }
            bar.set_position(bytes);
            if chunks > 1 {
                bar.set_message(format!("{}/{} chunks", completed, chunks));
            }
        })
    }

    /// Clear the bar after a successful download.
    pub fn finish(&self, bytes: u64) {
        self.bar
            .finish_with_message(format!("done, {}", HumanBytes(bytes)));
    }

    /// Remove the bar without a summary line.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    /// Leave the bar where it stopped.
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
