//! Canonical JSON encoding for cache entries.
//!
//! Every value persisted to the shared store goes through this module so
//! all instances agree on one encoding: JSON, enums as strings, unknown
//! fields ignored on read. Models cached here carry `#[serde(default)]`
//! on their collection fields, so entries written under a structurally
//! compatible older schema decode with the missing fields defaulted.
//! Structurally incompatible payloads fail with a typed [`CodecError`]
//! rather than producing a corrupt value.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Typed encode/decode failure.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be serialized. Only possible for values with
    /// non-string map keys or similar shape issues - a bug in the model.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored bytes are not a valid encoding of the requested type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a value into the canonical cache representation.
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, CodecError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(CodecError::Encode)
}

/// Decode bytes previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}
