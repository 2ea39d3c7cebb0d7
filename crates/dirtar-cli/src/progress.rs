//! Terminal rendering of archive events

use dirtar_core::{Event, EventSink, TracingSink};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shows each archived or extracted entry on a spinner line
///
/// Every event is also forwarded to `tracing`, so skips and rejections still
/// end up in the log, printed above the spinner instead of through it.
pub struct SpinnerSink {
    bar: ProgressBar,
    log: TracingSink,
}

impl SpinnerSink {
    pub fn new(enabled: bool, message: &str) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {prefix} [{elapsed_precise}] {pos} entries {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_prefix(message.to_string());

        Self {
            bar,
            log: TracingSink,
        }
    }

    /// Remove the spinner line from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl EventSink for SpinnerSink {
    fn emit(&mut self, event: Event) {
        match &event {
            Event::FileArchived { entry_path, .. } | Event::DirectoryArchived { entry_path } => {
                self.bar.inc(1);
                self.bar.set_message(entry_path.clone());
            }
            Event::Extracted { path } => {
                self.bar.inc(1);
                self.bar.set_message(path.display().to_string());
            }
            Event::Skipped { .. } | Event::Rejected { .. } | Event::Ignored { .. } => {}
        }

        let log = &mut self.log;
        self.bar.suspend(|| log.emit(event));
    }
}

impl Drop for SpinnerSink {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
