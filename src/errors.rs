//! Error types for indexer operations
//!
//! Storage and codec failures keep their own types and are wrapped here so
//! callers match on one enum. Missing keys are never errors; they come back
//! as `None` from `query`.

use std::time::Duration;
use thiserror::Error;

use crate::codec::CodecError;
use crate::storage::StorageError;

/// Result type alias for indexer operations
pub type IndexerResult<T> = Result<T, IndexerError>;

#[derive(Debug, Error)]
pub enum IndexerError {
    /// Batch precondition: one document per key
    #[error("Batch has {keys} keys but {documents} documents")]
    LengthMismatch { keys: usize, documents: usize },

    /// The indexer was used after `close`
    #[error("Indexer is closed")]
    Closed,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The background flusher thread could not be started
    #[error("Failed to spawn flusher thread: {0}")]
    WorkerSpawn(std::io::Error),

    /// The background flusher thread panicked before it could be joined
    #[error("Flusher thread panicked: {0}")]
    WorkerPanicked(String),
}

impl IndexerError {
    /// Check if error is transient and the operation may be retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            IndexerError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Check if the error signals use of a closed indexer
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, IndexerError::Closed)
    }
}

/// Backoff policy for retrying transient flush failures
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum retry delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Policy that reports the first failure without retrying
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Calculate delay for given retry number (0-based)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (self.initial_delay.as_millis() as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms).min(self.max_delay)
    }
}
