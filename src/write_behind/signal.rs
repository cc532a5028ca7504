//! Busy flag shared between the flusher and readers
//!
//! The flag is set for exactly the duration of one batch write. Alongside it
//! the signal counts batches that were enqueued but not yet written or
//! discarded, so callers can wait for the whole queue to settle. Both live
//! under one mutex so a waiter never observes a half-updated pair.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct SignalState {
    busy: bool,
    pending: usize,
}

#[derive(Debug, Default)]
pub struct FlushSignal {
    state: Mutex<SignalState>,
    changed: Condvar,
}

/// Holds the busy flag; dropping it marks the write finished
///
/// Clearing on drop keeps readers from waiting forever if a write panics.
#[must_use = "the busy flag is cleared as soon as the guard is dropped"]
pub struct BusyGuard<'a> {
    signal: &'a FlushSignal,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.signal.end_write();
    }
}

impl FlushSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch entering the queue
    pub fn batch_enqueued(&self) {
        self.state.lock().pending += 1;
    }

    /// Record batches that left the queue without being written
    pub fn batches_discarded(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut state = self.state.lock();
        state.pending = state.pending.saturating_sub(count);
        drop(state);
        self.changed.notify_all();
    }

    /// Raise the busy flag for one batch write
    pub fn begin_write(&self) -> BusyGuard<'_> {
        self.state.lock().busy = true;
        BusyGuard { signal: self }
    }

    fn end_write(&self) {
        let mut state = self.state.lock();
        state.busy = false;
        state.pending = state.pending.saturating_sub(1);
        drop(state);
        self.changed.notify_all();
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Batches enqueued but not yet written or discarded
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().pending
    }

    /// Block until no write is in flight
    ///
    /// There is no timeout: a wedged flusher blocks the caller indefinitely.
    pub fn wait_until_idle(&self) {
        let mut state = self.state.lock();
        while state.busy {
            self.changed.wait(&mut state);
        }
    }

    /// Block until nothing is pending and no write is in flight
    pub fn wait_until_drained(&self) {
        let mut state = self.state.lock();
        while state.busy || state.pending > 0 {
            self.changed.wait(&mut state);
        }
    }
}
