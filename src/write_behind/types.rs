//! Message and state types for the write-behind layer

use crate::indexer::EncodedBatch;

/// Item travelling through the write-behind queue
#[derive(Debug, Clone)]
pub enum FlushMessage {
    /// Write this batch atomically
    Write(EncodedBatch),
    /// Stop the flusher once this message is reached
    Shutdown,
}

/// Lifecycle of an `AsyncIndexer`; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IndexerState {
    /// Flusher running, `add` and `query` accepted
    Running = 0,
    /// `close` in progress
    Closing = 1,
    /// Flusher joined and storage closed
    Closed = 2,
}

impl IndexerState {
    #[inline]
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => IndexerState::Running,
            1 => IndexerState::Closing,
            _ => IndexerState::Closed,
        }
    }
}
