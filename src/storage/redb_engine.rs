//! Persistent storage engine backed by redb
//!
//! Each `add` becomes one redb write transaction, so a batch is committed
//! atomically or not at all. Reads open a short-lived read transaction and
//! never block the writer.

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::{Path, PathBuf};

use super::engine::{KvPair, StorageEngine};
use super::errors::{StorageError, StorageResult};

/// Single table holding encoded key -> encoded document
const DOCUMENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("documents");

/// redb-backed ordered key-value store
pub struct RedbEngine {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbEngine").field("path", &self.path).finish()
    }
}

impl RedbEngine {
    /// Open the database file at `path`, creating it (and its parent
    /// directory) if missing
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        // Create the table up front so readers never see TableDoesNotExist
        let txn = db.begin_write()?;
        txn.open_table(DOCUMENTS)?;
        txn.commit()?;

        tracing::debug!(path = %path.display(), "Opened redb store");

        Ok(Self { db, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageEngine for RedbEngine {
    fn write_batch(&self, pairs: &[KvPair]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOCUMENTS)?;
            for (key, value) in pairs {
                table.insert(key.as_slice(), value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    fn len(&self) -> StorageResult<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        Ok(table.len()?)
    }

    fn close(self) -> StorageResult<()> {
        tracing::debug!(path = %self.path.display(), "Closing redb store");
        drop(self.db);
        Ok(())
    }
}
