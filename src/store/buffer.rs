//! Batching buffer for encoded line-protocol lines.
//!
//! Lines accumulate until either the size threshold is reached or the flush
//! interval has elapsed since the last flush, whichever comes first.

use std::time::{Duration, Instant};

/// Size/time dual-threshold batch accumulator.
pub(crate) struct BatchBuffer {
    lines: Vec<String>,
    max_size: usize,
    flush_interval: Duration,
    last_flush: Instant,
}

impl BatchBuffer {
    pub(crate) fn new(max_size: usize, flush_interval: Duration) -> Self {
        Self {
            lines: Vec::with_capacity(max_size),
            max_size,
            flush_interval,
            last_flush: Instant::now(),
        }
    }

    /// Add a line. Returns the full batch when the size threshold is hit,
    /// `None` while there is still room.
    pub(crate) fn add(&mut self, line: String) -> Option<Vec<String>> {
        // Reset the timer on first push so a long-idle buffer isn't
        // immediately considered overdue.
        if self.lines.is_empty() {
            self.last_flush = Instant::now();
        }
        self.lines.push(line);
        if self.lines.len() >= self.max_size {
            Some(self.take())
        } else {
            None
        }
    }

    /// Whether a time-based flush is due.
    pub(crate) fn should_flush(&self) -> bool {
        !self.lines.is_empty() && self.last_flush.elapsed() >= self.flush_interval
    }

    /// Time remaining until the next time-based flush, `None` when empty.
    pub(crate) fn time_until_flush(&self) -> Option<Duration> {
        if self.lines.is_empty() {
            None
        } else {
            Some(self.flush_interval.saturating_sub(self.last_flush.elapsed()))
        }
    }

    /// Drain all accumulated lines and reset the timer.
    pub(crate) fn take(&mut self) -> Vec<String> {
        self.last_flush = Instant::now();
        std::mem::take(&mut self.lines)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
