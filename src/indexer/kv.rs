//! The synchronous indexer

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use super::batch::EncodedBatch;
use crate::codec;
use crate::config::IndexerConfig;
use crate::errors::{IndexerError, IndexerResult};
use crate::storage::{RedbEngine, StorageEngine};

/// Key/document index writing straight to a storage engine
///
/// Keys of type `K` map to documents of type `D`. The engine handle lives
/// behind a lock only so `close` can take it; reads and writes share the lock
/// and rely on the engine's own batch atomicity.
pub struct KvIndexer<K, D, E = RedbEngine> {
    engine: RwLock<Option<E>>,
    data_path: PathBuf,
    _types: PhantomData<fn(&K) -> D>,
}

impl<K, D, E> std::fmt::Debug for KvIndexer<K, D, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvIndexer")
            .field("data_path", &self.data_path)
            .field("closed", &self.engine.read().is_none())
            .finish()
    }
}

impl<K, D> KvIndexer<K, D, RedbEngine> {
    /// Open (or create) the persistent index described by `config`
    pub fn open(config: &IndexerConfig) -> IndexerResult<Self> {
        std::fs::create_dir_all(config.data_path()).map_err(crate::storage::StorageError::from)?;
        let engine = RedbEngine::open(config.database_path())?;

        tracing::info!(path = %config.data_path().display(), "Opened document index");
        Ok(Self::with_engine(engine, config.data_path()))
    }
}

impl<K, D, E: StorageEngine> KvIndexer<K, D, E> {
    /// Wrap an already opened engine
    pub fn with_engine(engine: E, data_path: impl Into<PathBuf>) -> Self {
        Self {
            engine: RwLock::new(Some(engine)),
            data_path: data_path.into(),
            _types: PhantomData,
        }
    }

    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Write a pre-encoded batch in one atomic engine write
    pub fn write_encoded(&self, batch: &EncodedBatch) -> IndexerResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let guard = self.engine.read();
        let engine = guard.as_ref().ok_or(IndexerError::Closed)?;
        engine.write_batch(batch.pairs())?;
        Ok(())
    }

    /// Number of stored keys
    pub fn len(&self) -> IndexerResult<u64> {
        let guard = self.engine.read();
        let engine = guard.as_ref().ok_or(IndexerError::Closed)?;
        Ok(engine.len()?)
    }

    pub fn is_empty(&self) -> IndexerResult<bool> {
        Ok(self.len()? == 0)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.engine.read().is_none()
    }

    /// Close the engine handle; later calls fail with `IndexerError::Closed`
    pub fn close(&self) -> IndexerResult<()> {
        let engine = self.engine.write().take().ok_or(IndexerError::Closed)?;
        engine.close()?;
        tracing::info!(path = %self.data_path.display(), "Closed document index");
        Ok(())
    }

    fn lookup(&self, encoded_key: &[u8]) -> IndexerResult<Option<Vec<u8>>> {
        let guard = self.engine.read();
        let engine = guard.as_ref().ok_or(IndexerError::Closed)?;
        Ok(engine.get(encoded_key)?)
    }
}

impl<K, D, E> KvIndexer<K, D, E>
where
    K: Serialize,
    D: Serialize + DeserializeOwned,
    E: StorageEngine,
{
    /// Upsert `keys[i] -> documents[i]` as one atomic batch
    pub fn add(&self, keys: &[K], documents: &[D]) -> IndexerResult<()> {
        if self.is_closed() {
            return Err(IndexerError::Closed);
        }
        let batch = EncodedBatch::encode(keys, documents)?;
        self.write_encoded(&batch)
    }

    /// Look up every key, in order; `None` marks a key with no stored document
    ///
    /// `top_k` exists for parity with similarity indexers. Lookups here are
    /// exact, so it has no effect.
    pub fn query(&self, keys: &[K], _top_k: usize) -> IndexerResult<Vec<Option<D>>> {
        keys.iter()
            .map(|key| -> IndexerResult<Option<D>> {
                let encoded = codec::encode(key)?;
                match self.lookup(&encoded)? {
                    Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
                    None => Ok(None),
                }
            })
            .collect()
    }

    pub fn contains(&self, key: &K) -> IndexerResult<bool> {
        Ok(self.lookup(&codec::encode(key)?)?.is_some())
    }
}
