//! Write-behind indexing with a dedicated flusher thread
//!
//! `AsyncIndexer::add` encodes a batch on the caller's thread, queues it and
//! returns. A single background flusher drains the queue and writes each batch
//! through the synchronous `KvIndexer`, raising a busy flag for the duration
//! of every write. `query` waits for the flag to drop and then reads the store
//! directly, so it never overlaps a write but may miss batches that are still
//! queued.
//!
//! # Architecture
//!
//! - `types` - Queue messages and lifecycle states
//! - `queue` - Channel-backed pending batch queue
//! - `signal` - Busy flag and pending counter with blocking waits
//! - `stats` - Lock-free counters and the failed batch log
//! - `service` - The flusher thread and its retry loop
//! - `async_indexer` - Public façade tying the pieces together
//!
//! # Example
//!
//! ```ignore
//! use kodegen_tools_kvindex::{AsyncIndexer, IndexerConfig};
//!
//! let config = IndexerConfig::builder().data_path("/var/lib/kvindex").build()?;
//! let indexer: AsyncIndexer<u64, String> = AsyncIndexer::open(&config)?;
//!
//! indexer.add(&[1, 2], &["a".to_string(), "b".to_string()])?;
//! indexer.flush()?;
//! assert_eq!(indexer.query(&[1, 3], 1)?, vec![Some("a".to_string()), None]);
//! indexer.close()?;
//! ```

mod async_indexer;
mod queue;
mod service;
mod signal;
mod stats;
mod types;

// Re-export public API
pub use async_indexer::AsyncIndexer;
pub use queue::WriteBehindQueue;
pub use signal::{BusyGuard, FlushSignal};
pub use stats::{FailureLog, FlushFailure, FlushStats, FlushStatsSnapshot};
pub use types::{FlushMessage, IndexerState};
