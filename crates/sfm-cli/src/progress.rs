//! Terminal progress for pipeline runs.

use indicatif::{ProgressBar, ProgressStyle};

use sfm_transform::ProgressSink;

/// Total progress units a full run reports.
const TOTAL: u64 = 100;

/// [`ProgressSink`] backed by an `indicatif` bar; hidden when quiet.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(TOTAL);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                         {percent:>3}% {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        };
        Self { bar }
    }

    /// Start the bar at `position`, for runs resumed partway through.
    pub fn set_position(&self, position: u64) {
        self.bar.set_position(position.min(TOTAL));
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ProgressSink for BarProgress {
    fn step(&mut self, increment: u32, message: &str) {
        self.bar.inc(u64::from(increment));
        self.bar.set_message(message.to_string());
    }
}
