//! Configuration module for the document index
//!
//! This module provides the `IndexerConfig` struct and its type-safe builder.
//! The config is the persistent half of an indexer: it can be written next to
//! the data and read back to re-open live handles after a restart.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{IndexerConfigBuilder, WithDataPath};
pub use types::{
    DEFAULT_FILE_NAME, DEFAULT_MAX_RECORDED_FAILURES, DEFAULT_WORKER_THREAD_NAME, IndexerConfig,
    SNAPSHOT_FILE_NAME, ShutdownMode,
};
