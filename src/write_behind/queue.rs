//! Pending batch queue shared by `add` callers and the flusher
//!
//! Backed by an unbounded crossbeam channel: any number of threads may
//! enqueue while the single flusher dequeues, and every operation is atomic
//! with respect to the others. Batches are delivered first-in, first-out.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::types::FlushMessage;
use crate::indexer::EncodedBatch;

#[derive(Debug)]
pub struct WriteBehindQueue {
    sender: Sender<FlushMessage>,
    receiver: Receiver<FlushMessage>,
}

impl Default for WriteBehindQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteBehindQueue {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Append a batch; never blocks
    #[inline]
    pub fn enqueue(&self, batch: EncodedBatch) {
        // Both channel ends live in `self`, so the channel cannot be disconnected
        let _ = self.sender.send(FlushMessage::Write(batch));
    }

    /// Queue a shutdown marker behind everything already enqueued
    #[inline]
    pub fn signal_shutdown(&self) {
        let _ = self.sender.send(FlushMessage::Shutdown);
    }

    /// Take the next message without waiting; `None` when the queue is empty
    #[inline]
    #[must_use]
    pub fn try_dequeue(&self) -> Option<FlushMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until a message is available
    #[inline]
    #[must_use]
    pub fn dequeue(&self) -> Option<FlushMessage> {
        self.receiver.recv().ok()
    }

    /// Drop every queued batch and return how many were discarded
    ///
    /// A shutdown marker found while clearing is put back so the flusher still
    /// observes it.
    pub fn clear(&self) -> usize {
        let mut discarded = 0;
        let mut saw_shutdown = false;
        for message in self.receiver.try_iter() {
            match message {
                FlushMessage::Write(_) => discarded += 1,
                FlushMessage::Shutdown => saw_shutdown = true,
            }
        }
        if saw_shutdown {
            self.signal_shutdown();
        }
        discarded
    }

    /// Number of queued messages
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
