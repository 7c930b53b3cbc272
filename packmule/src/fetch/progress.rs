//! Byte-accurate progress accounting for concurrent downloads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Thread-safe completed/total byte counters shared by all download
/// tasks of a fetch run.
///
/// `record` is called from many tasks as body chunks arrive; the
/// published value is a high-water mark, so observers see a
/// monotonically non-decreasing sequence that never exceeds the
/// precomputed total even when concurrent items interleave. A failed
/// item's partial contribution is rolled back so a retry can re-count
/// it and the final value equals the byte sum of the items that
/// actually succeeded.
pub struct ProgressTracker {
    /// Bytes received across all live and completed items.
    completed: AtomicU64,
    /// Sum of the advertised sizes of all items in the run.
    total: u64,
    /// Last value published to the observer. Guarded so concurrent
    /// publications cannot reorder.
    published: Mutex<u64>,
}

impl ProgressTracker {
    /// Creates a tracker for a run totalling `total` bytes.
    pub fn new(total: u64) -> Self {
        Self {
            completed: AtomicU64::new(0),
            total,
            published: Mutex::new(0),
        }
    }

    /// Sum of the advertised sizes of all items in the run.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bytes received so far, clamped to the total.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire).min(self.total)
    }

    /// Records `bytes` freshly received body bytes and publishes the new
    /// high-water mark through `notify`.
    ///
    /// `notify` runs under the publication lock, so across all tasks the
    /// observed `(completed, total)` sequence is non-decreasing.
    pub fn record(&self, bytes: u64, notify: impl FnOnce(u64, u64)) {
        self.completed.fetch_add(bytes, Ordering::AcqRel);

        let mut published = self.published.lock().expect("progress lock poisoned");
        let current = self.completed();
        if current > *published {
            *published = current;
            notify(current, self.total);
        }
    }

    /// Removes a failed item's partial contribution.
    ///
    /// The published high-water mark is left in place; only the internal
    /// counter moves back, so a retried item can re-count its bytes
    /// without the run ever reporting more than the total.
    pub fn roll_back(&self, bytes: u64) {
        self.completed.fetch_sub(bytes, Ordering::AcqRel);
    }
}
