// glaciertool/src/progress.rs
//! Live progress display for the listing and restore pipelines.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Cloneable handle; every clone drives the same bar.
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Counter bar for `total` items: `123/4567 [=====>    ] 2%`.
    pub fn counter(total: u64, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        bar.set_length(total);

        if let Ok(style) =
            ProgressStyle::default_bar().template("{pos}/{len} [{bar:40.cyan/blue}] {percent}% {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }

        Self { bar }
    }

    /// Spinner for work of unknown size, e.g. a paginated listing.
    pub fn spinner(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };

        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            bar.set_style(style);
        }
        if visible {
            bar.enable_steady_tick(Duration::from_millis(100));
        }

        Self { bar }
    }

    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.bar.set_message(status.into());
    }

    /// Stops the bar at its current position. A counter that did not reach
    /// its length is left showing how far it got.
    pub fn finish(&self, message: impl Into<String>) {
        let message = message.into();
        match self.bar.length() {
            Some(len) if self.bar.position() < len => self.bar.abandon_with_message(message),
            _ => self.bar.finish_with_message(message),
        }
    }
}
