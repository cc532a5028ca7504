//! Pre-encoded batches handed from callers to the storage engine

use serde::Serialize;

use crate::codec;
use crate::errors::{IndexerError, IndexerResult};
use crate::storage::KvPair;

/// One `add` call, encoded and ready for a single atomic write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedBatch {
    pairs: Vec<KvPair>,
}

impl EncodedBatch {
    /// Encode `keys[i] -> documents[i]` for every `i`
    ///
    /// Fails before encoding anything when the two slices differ in length.
    pub fn encode<K: Serialize, D: Serialize>(keys: &[K], documents: &[D]) -> IndexerResult<Self> {
        if keys.len() != documents.len() {
            return Err(IndexerError::LengthMismatch {
                keys: keys.len(),
                documents: documents.len(),
            });
        }

        let pairs = keys
            .iter()
            .zip(documents)
            .map(|(key, doc)| -> IndexerResult<KvPair> {
                Ok((codec::encode(key)?, codec::encode(doc)?))
            })
            .collect::<IndexerResult<Vec<_>>>()?;

        Ok(Self { pairs })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn pairs(&self) -> &[KvPair] {
        &self.pairs
    }
}
