//! Getter methods for `IndexerConfig`

use std::path::{Path, PathBuf};

use super::types::{IndexerConfig, SNAPSHOT_FILE_NAME, ShutdownMode};
use crate::errors::RetryPolicy;

impl IndexerConfig {
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full path of the database file
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_path.join(&self.file_name)
    }

    /// Full path of the persisted config snapshot
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_path.join(SNAPSHOT_FILE_NAME)
    }

    #[must_use]
    pub fn shutdown_mode(&self) -> ShutdownMode {
        self.shutdown_mode
    }

    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub fn max_recorded_failures(&self) -> usize {
        self.max_recorded_failures
    }

    #[must_use]
    pub fn worker_thread_name(&self) -> &str {
        &self.worker_thread_name
    }
}
