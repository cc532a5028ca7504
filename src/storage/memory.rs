//! In-process storage engine
//!
//! Same contract as the persistent engine without touching disk. Used for
//! ephemeral indexes and to exercise the write-behind layer in tests.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::engine::{KvPair, StorageEngine};
use super::errors::StorageResult;

#[derive(Debug, Default)]
pub struct MemoryEngine {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageEngine for MemoryEngine {
    fn write_batch(&self, pairs: &[KvPair]) -> StorageResult<()> {
        // Holding the write guard for the whole batch keeps it atomic to readers
        let mut entries = self.entries.write();
        for (key, value) in pairs {
            entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.entries.read().len() as u64)
    }

    fn close(self) -> StorageResult<()> {
        Ok(())
    }
}
