//! Progress reporting for long-running exports and imports.
//!
//! Every operation drives a single [`ProgressTracker`]. Sub-stages get a
//! [`StageProgress`] covering a band of the 0-100 range, so per-item
//! callbacks from different stages still form one non-decreasing stream.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Denominator passed with every progress report.
pub const PROGRESS_TOTAL: u8 = 100;

/// Receiver of `(percent, total, message)` progress reports.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8, total: u8, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(u8, u8, &str) + Send + Sync,
{
    fn report(&self, percent: u8, total: u8, message: &str) {
        self(percent, total, message)
    }
}

/// Receiver of per-item progress inside one stage.
pub trait ItemProgress: Send + Sync {
    fn item(&self, current: usize, total: usize, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _percent: u8, _total: u8, _message: &str) {}
}

impl ItemProgress for NullProgress {
    fn item(&self, _current: usize, _total: usize, _message: &str) {}
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Monotonic wrapper around a [`ProgressSink`].
///
/// Values are clamped so that intermediate reports never go backwards and
/// never reach 100; only [`ProgressTracker::finish`] emits 100, and only
/// once.
pub struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    last: AtomicU8,
    finished: AtomicBool,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last: AtomicU8::new(0),
            finished: AtomicBool::new(false),
        }
    }

    /// Report `percent` (0-100, fractional values are rounded).
    pub fn report(&self, percent: f64, message: &str) {
        if self.finished.load(Ordering::Acquire) {
            return;
        }
        let requested = percent.round().clamp(0.0, f64::from(PROGRESS_TOTAL - 1)) as u8;
        let previous = self.last.fetch_max(requested, Ordering::AcqRel);
        self.sink
            .report(requested.max(previous), PROGRESS_TOTAL, message);
    }

    /// Emit the terminal 100% report. Later calls are ignored.
    pub fn finish(&self, message: &str) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        self.last.store(PROGRESS_TOTAL, Ordering::Release);
        self.sink.report(PROGRESS_TOTAL, PROGRESS_TOTAL, message);
    }

    /// A sub-stage covering `start..=end` percent.
    pub fn stage(&self, start: f64, end: f64) -> StageProgress<'_, 'a> {
        StageProgress {
            tracker: self,
            start,
            end: end.max(start),
        }
    }
}

/// A band of the progress range that maps item counts onto percents.
pub struct StageProgress<'t, 'a> {
    tracker: &'t ProgressTracker<'a>,
    start: f64,
    end: f64,
}

impl StageProgress<'_, '_> {
    /// Percent for `current` of `total` items within this band.
    pub fn percent_for(&self, current: usize, total: usize) -> f64 {
        if total == 0 {
            return self.end;
        }
        let fraction = (current as f64 / total as f64).clamp(0.0, 1.0);
        self.start + fraction * (self.end - self.start)
    }

    /// Report the start of the band.
    pub fn begin(&self, message: &str) {
        self.tracker.report(self.start, message);
    }
}

impl ItemProgress for StageProgress<'_, '_> {
    fn item(&self, current: usize, total: usize, message: &str) {
        self.tracker.report(self.percent_for(current, total), message);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
