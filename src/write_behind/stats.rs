//! Lock-free statistics and failure reporting for the flusher
//!
//! Flush failures happen after `add` has already returned, so they are
//! recorded here for callers to inspect instead of being returned.

use chrono::{DateTime, Utc};
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free flush statistics
#[derive(Debug, Default)]
pub struct FlushStats {
    pub batches_enqueued: AtomicUsize,
    pub batches_flushed: AtomicUsize,
    pub batches_failed: AtomicUsize,
    pub batches_discarded: AtomicUsize,
    pub documents_written: AtomicUsize,
    pub retries: AtomicUsize,
    pub last_flush: Mutex<Option<DateTime<Utc>>>,
}

impl FlushStats {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_flush(&self, documents: usize) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.documents_written
            .fetch_add(documents, Ordering::Relaxed);
        *self.last_flush.lock() = Some(Utc::now());
    }

    /// Get snapshot of current statistics
    ///
    /// `failures_dropped` comes from the companion [`FailureLog::overflow`].
    #[must_use]
    pub fn snapshot(&self, failures_dropped: usize) -> FlushStatsSnapshot {
        FlushStatsSnapshot {
            batches_enqueued: self.batches_enqueued.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            batches_discarded: self.batches_discarded.load(Ordering::Relaxed),
            documents_written: self.documents_written.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failures_dropped,
            last_flush: *self.last_flush.lock(),
        }
    }
}

/// Immutable snapshot of flush statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushStatsSnapshot {
    pub batches_enqueued: usize,
    pub batches_flushed: usize,
    pub batches_failed: usize,
    pub batches_discarded: usize,
    pub documents_written: usize,
    pub retries: usize,
    /// Failures counted but not kept because the failure log was full
    pub failures_dropped: usize,
    pub last_flush: Option<DateTime<Utc>>,
}

/// A batch the flusher gave up on
#[derive(Debug, Clone)]
pub struct FlushFailure {
    /// Number of documents in the lost batch
    pub documents: usize,
    /// Write attempts made, including retries
    pub attempts: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Bounded log of flush failures
///
/// Once `max_entries` failures are held, newer ones are only counted in
/// `overflow` until the log is drained.
#[derive(Debug)]
pub struct FailureLog {
    entries: SegQueue<FlushFailure>,
    max_entries: usize,
    overflow: AtomicUsize,
}

impl FailureLog {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: SegQueue::new(),
            max_entries,
            overflow: AtomicUsize::new(0),
        }
    }

    pub fn record(&self, failure: FlushFailure) {
        if self.entries.len() >= self.max_entries {
            self.overflow.fetch_add(1, Ordering::Relaxed);
        } else {
            self.entries.push(failure);
        }
    }

    /// Remove and return every recorded failure, oldest first
    pub fn drain(&self) -> Vec<FlushFailure> {
        let mut failures = Vec::with_capacity(self.entries.len());
        while let Some(failure) = self.entries.pop() {
            failures.push(failure);
        }
        failures
    }

    /// Failures dropped because the log was full
    #[must_use]
    pub fn overflow(&self) -> usize {
        self.overflow.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
