//! Persistence of `IndexerConfig`
//!
//! Live resources (store handle, flusher thread) are never serialized. The
//! config snapshot is enough to rebuild them with `KvIndexer::open` or
//! `AsyncIndexer::open`.

use anyhow::{Context, Result};
use std::path::Path;

use super::types::{IndexerConfig, SNAPSHOT_FILE_NAME};

impl IndexerConfig {
    /// Write the config snapshot into the data directory
    pub fn persist(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_path)
            .with_context(|| format!("Failed to create data directory: {:?}", self.data_path))?;

        let snapshot = self.snapshot_path();
        let json = serde_json::to_vec_pretty(self).context("Failed to serialize indexer config")?;
        std::fs::write(&snapshot, json)
            .with_context(|| format!("Failed to write config snapshot: {snapshot:?}"))?;

        tracing::debug!(path = %snapshot.display(), "Persisted indexer config");
        Ok(())
    }

    /// Read a snapshot previously written by [`IndexerConfig::persist`]
    ///
    /// `data_path` is taken from `dir` rather than the snapshot so a data
    /// directory can be moved as a whole.
    pub fn restore(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = std::path::absolute(dir.as_ref())?;
        let snapshot = dir.join(SNAPSHOT_FILE_NAME);
        let bytes = std::fs::read(&snapshot)
            .with_context(|| format!("Failed to read config snapshot: {snapshot:?}"))?;

        let mut config: IndexerConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("Invalid config snapshot: {snapshot:?}"))?;
        config.data_path = dir;
        Ok(config)
    }
}
