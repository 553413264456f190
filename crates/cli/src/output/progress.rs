//! Transfer progress on stderr

use std::time::Duration;

use indicatif::ProgressStyle;

use super::OutputConfig;

const SIZED: &str =
    "{spinner:.green} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";
const UNSIZED: &str = "{spinner:.green} {msg} {bytes} ({bytes_per_sec})";

/// Byte counter for one transfer; a no-op when output is quiet, JSON or
/// `--no-progress`
#[derive(Debug, Clone)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Bar when `total` is known, spinner otherwise
    pub fn bytes(config: &OutputConfig, total: Option<u64>, message: &str) -> Self {
        if config.quiet || config.json || config.no_progress {
            return Self { bar: None };
        }

        let bar = match total {
            Some(len) => {
                let bar = indicatif::ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template(SIZED) {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar
            }
            None => {
                let bar = indicatif::ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template(UNSIZED) {
                    bar.set_style(style);
                }
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        };
        bar.set_message(message.to_owned());
        Self { bar: Some(bar) }
    }

    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}
