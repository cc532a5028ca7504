//! Type-safe builder for `IndexerConfig` using the typestate pattern
//!
//! `build` is only reachable once a data path has been supplied.

use anyhow::{Result, bail};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{
    DEFAULT_FILE_NAME, DEFAULT_MAX_RECORDED_FAILURES, DEFAULT_WORKER_THREAD_NAME, IndexerConfig,
    ShutdownMode,
};
use crate::errors::RetryPolicy;

// Type states for the builder
pub struct WithDataPath;

pub struct IndexerConfigBuilder<State = ()> {
    pub(crate) data_path: Option<PathBuf>,
    pub(crate) file_name: String,
    pub(crate) shutdown_mode: ShutdownMode,
    pub(crate) retry: RetryPolicy,
    pub(crate) max_recorded_failures: usize,
    pub(crate) worker_thread_name: String,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for IndexerConfigBuilder<()> {
    fn default() -> Self {
        Self {
            data_path: None,
            file_name: DEFAULT_FILE_NAME.to_string(),
            shutdown_mode: ShutdownMode::default(),
            retry: RetryPolicy::default(),
            max_recorded_failures: DEFAULT_MAX_RECORDED_FAILURES,
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl IndexerConfig {
    /// Create a builder for configuring an `IndexerConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> IndexerConfigBuilder<()> {
        IndexerConfigBuilder::default()
    }
}

impl IndexerConfigBuilder<()> {
    pub fn data_path(self, dir: impl Into<PathBuf>) -> IndexerConfigBuilder<WithDataPath> {
        IndexerConfigBuilder {
            data_path: Some(dir.into()),
            file_name: self.file_name,
            shutdown_mode: self.shutdown_mode,
            retry: self.retry,
            max_recorded_failures: self.max_recorded_failures,
            worker_thread_name: self.worker_thread_name,
            _phantom: PhantomData,
        }
    }
}

impl<State> IndexerConfigBuilder<State> {
    #[must_use]
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    #[must_use]
    pub fn shutdown_mode(mut self, mode: ShutdownMode) -> Self {
        self.shutdown_mode = mode;
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    #[must_use]
    pub fn max_recorded_failures(mut self, limit: usize) -> Self {
        self.max_recorded_failures = limit;
        self
    }

    #[must_use]
    pub fn worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }
}

// Build method only available when all required fields are set
impl IndexerConfigBuilder<WithDataPath> {
    pub fn build(self) -> Result<IndexerConfig> {
        let Some(data_path) = self.data_path else {
            bail!("data path is required");
        };

        if self.file_name.is_empty()
            || self.file_name.contains(std::path::is_separator)
            || self.file_name == ".."
        {
            bail!("Invalid database file name '{}'", self.file_name);
        }

        if self.worker_thread_name.is_empty() {
            bail!("Worker thread name must not be empty");
        }

        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            bail!(
                "Retry backoff multiplier must be >= 1.0, got {}",
                self.retry.backoff_multiplier
            );
        }

        let data_path = std::path::absolute(&data_path)?;

        Ok(IndexerConfig {
            data_path,
            file_name: self.file_name,
            shutdown_mode: self.shutdown_mode,
            retry: self.retry,
            max_recorded_failures: self.max_recorded_failures,
            worker_thread_name: self.worker_thread_name,
        })
    }
}
