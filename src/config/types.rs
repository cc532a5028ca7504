//! Core configuration types for the document index

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::RetryPolicy;

/// Database file created inside the data directory
pub const DEFAULT_FILE_NAME: &str = "documents.redb";

/// Config snapshot written by `IndexerConfig::persist`
pub const SNAPSHOT_FILE_NAME: &str = "indexer.json";

/// Failed batches kept for `take_flush_failures` before older ones are dropped
pub const DEFAULT_MAX_RECORDED_FAILURES: usize = 256;

pub const DEFAULT_WORKER_THREAD_NAME: &str = "kvindex-flusher";

/// What `close` does with batches still waiting in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMode {
    /// Discard queued batches, then stop the flusher
    #[default]
    Discard,
    /// Let the flusher write every queued batch, then stop
    Drain,
}

/// Main configuration struct for document indexers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Directory holding the database file and config snapshot.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) data_path: PathBuf,
    pub(crate) file_name: String,
    pub(crate) shutdown_mode: ShutdownMode,
    pub(crate) retry: RetryPolicy,
    pub(crate) max_recorded_failures: usize,
    pub(crate) worker_thread_name: String,
}
