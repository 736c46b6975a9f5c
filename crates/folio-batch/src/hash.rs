//! Canonical body hashing for idempotent replay.

use crate::error::{BatchError, Result};

/// Domain tag so batch body hashes never collide with hashes computed for
/// other purposes.
const HASH_DOMAIN: &[u8] = b"folio-batch-v1:";

/// Hash of the canonical JSON encoding of `value`, domain-separated.
///
/// Equal requests hash equally because every hashed shape is built from
/// normalized fields and sorted-key metadata.
pub fn hash_json<T: serde::Serialize>(value: &T) -> Result<[u8; 32]> {
    let encoded =
        serde_json::to_vec(value).map_err(|e| BatchError::Serialization(e.to_string()))?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(HASH_DOMAIN);
    hasher.update(&encoded);
    Ok(*hasher.finalize().as_bytes())
}
