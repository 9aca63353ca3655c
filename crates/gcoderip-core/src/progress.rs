//! Throttled progress reporting

use std::time::{Duration, Instant};

/// Progress callback: `(processed, total)`
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Report after this many items even if the interval has not elapsed
pub const DEFAULT_REPORT_EVERY: u64 = 1000;

/// Report at least this often while work is progressing
pub const REPORT_INTERVAL: Duration = Duration::from_millis(400);

/// Calls a [`ProgressCallback`] at a bounded cadence
pub struct ProgressReporter<'a> {
    callback: Option<&'a (dyn Fn(u64, u64) + Send + Sync)>,
    total: u64,
    every: u64,
    last_count: u64,
    last_time: Instant,
}

impl<'a> ProgressReporter<'a> {
    /// Create a reporter; `callback` may be `None` for a no-op reporter
    pub fn new(callback: Option<&'a ProgressCallback>, total: u64) -> Self {
        Self {
            callback: callback.map(|cb| cb.as_ref()),
            total,
            every: DEFAULT_REPORT_EVERY,
            last_count: 0,
            last_time: Instant::now(),
        }
    }

    /// Override the item cadence
    pub fn with_every(mut self, every: u64) -> Self {
        self.every = every.max(1);
        self
    }

    /// Record that `processed` items are done
    pub fn tick(&mut self, processed: u64) {
        let Some(callback) = self.callback else {
            return;
        };
        if processed.saturating_sub(self.last_count) >= self.every
            || self.last_time.elapsed() >= REPORT_INTERVAL
        {
            callback(processed, self.total);
            self.last_count = processed;
            self.last_time = Instant::now();
        }
    }

    /// Report completion
    pub fn finish(&mut self) {
        if let Some(callback) = self.callback {
            callback(self.total, self.total);
        }
        tracing::trace!(total = self.total, "progress finished");
    }
}
