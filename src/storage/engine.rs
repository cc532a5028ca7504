//! The storage contract consumed by the indexers

use super::errors::StorageResult;

/// One encoded key/value pair ready to be written
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Ordered byte-keyed store with atomic batch writes
///
/// Implementations must be shareable across threads: the background flusher
/// writes while caller threads read. A batch passed to `write_batch` is
/// applied all-or-nothing; for duplicate keys inside one batch the later pair
/// wins.
pub trait StorageEngine: Send + Sync + 'static {
    /// Atomically upsert every pair in `pairs`
    fn write_batch(&self, pairs: &[KvPair]) -> StorageResult<()>;

    /// Point lookup; `Ok(None)` when the key was never written
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Number of stored keys
    fn len(&self) -> StorageResult<u64>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Release the underlying handle
    fn close(self) -> StorageResult<()>
    where
        Self: Sized;
}
