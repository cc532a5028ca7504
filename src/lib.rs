//! Key/document index over an embedded store, with a write-behind mode
//!
//! - [`KvIndexer`] writes every `add` to storage before returning.
//! - [`AsyncIndexer`] queues writes and applies them on a dedicated flusher
//!   thread; `query` waits only for an in-flight write, never for the queue.
//!
//! Keys and documents are any serde types, stored through the versioned
//! binary [`codec`]. Lookups return `None` for keys that were never added.

pub mod codec;
pub mod config;
pub mod errors;
pub mod indexer;
pub mod storage;
pub mod write_behind;

pub use config::{IndexerConfig, ShutdownMode};
pub use errors::{IndexerError, IndexerResult, RetryPolicy};
pub use indexer::{EncodedBatch, KvIndexer};
pub use storage::{MemoryEngine, RedbEngine, StorageEngine, StorageError};
pub use write_behind::{AsyncIndexer, FlushFailure, FlushStatsSnapshot, IndexerState};
