//! Synchronous key/document indexer
//!
//! `KvIndexer` encodes keys and documents with the versioned codec and writes
//! every `add` as one atomic batch. It is the write path used directly by
//! callers and by the write-behind flusher.

pub mod batch;
pub mod kv;

pub use batch::EncodedBatch;
pub use kv::KvIndexer;
