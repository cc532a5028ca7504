//! Versioned binary encoding for keys and documents
//!
//! Every encoded value is one format-version byte followed by the MessagePack
//! representation, with structs written as maps keyed by field name. The body
//! is self-describing, so documents that rely on `deserialize_any`
//! (`serde_json::Value`, untagged enums, flattened or skipped fields) read
//! back intact. Encoding is deterministic, so equal keys always map to the
//! same storage key.

use std::io::Cursor;

use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};
use thiserror::Error;

/// Version byte written in front of every encoded value
pub const FORMAT_VERSION: u8 = 2;

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to encode value: {0}")]
    Encode(String),

    #[error("Failed to decode value: {0}")]
    Decode(String),

    #[error("Cannot decode an empty buffer")]
    Empty,

    #[error("Unsupported encoding version {found} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion { found: u8 },

    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),
}

/// Encode `value` into a versioned byte string
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut out = vec![FORMAT_VERSION];
    let mut serializer = rmp_serde::Serializer::new(&mut out).with_struct_map();
    value
        .serialize(&mut serializer)
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decode a byte string produced by [`encode`]
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    let (&version, body) = bytes.split_first().ok_or(CodecError::Empty)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }

    let mut cursor = Cursor::new(body);
    let value = {
        let mut deserializer = rmp_serde::Deserializer::new(&mut cursor);
        T::deserialize(&mut deserializer).map_err(|e| CodecError::Decode(e.to_string()))?
    };

    let consumed = usize::try_from(cursor.position()).unwrap_or(body.len());
    if consumed != body.len() {
        return Err(CodecError::TrailingBytes(body.len() - consumed));
    }
    Ok(value)
}
