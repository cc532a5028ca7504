//! Storage engine adapters for the document index
//!
//! The index treats its backing store as an opaque, ordered, byte-keyed map
//! that supports atomic batched writes and point lookups. `StorageEngine`
//! captures that contract; `RedbEngine` is the persistent implementation and
//! `MemoryEngine` keeps everything in process.

pub mod engine;
pub mod errors;
pub mod memory;
pub mod redb_engine;

pub use engine::{KvPair, StorageEngine};
pub use errors::{StorageError, StorageResult};
pub use memory::MemoryEngine;
pub use redb_engine::RedbEngine;
