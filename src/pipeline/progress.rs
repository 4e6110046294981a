use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};

/// Completion-order progress observer. The orchestrator calls `begin` once
/// with the catalog size, `advance` once per finished acquisition, and
/// `finish` once after the last one; none of it affects results.
pub trait ProgressSink {
    fn begin(&self, total: u64);
    fn advance(&self, key: NaiveDate);
    fn finish(&self);
}

/// Sink for callers that do not want progress output.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn begin(&self, _total: u64) {}
    fn advance(&self, _key: NaiveDate) {}
    fn finish(&self) {}
}

/// Terminal progress bar over the extraction fan-in.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn begin(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn advance(&self, key: NaiveDate) {
        self.bar.set_message(key.to_string());
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
