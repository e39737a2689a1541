use crate::models::{ContentHash, CONTENT_HASH_BYTES};
use sha2::{Digest, Sha256};

/// Digests raw document bytes into the index key.
///
/// SHA-256 rather than the standard library hasher: content addressing
/// needs a digest that is stable across processes and machines.
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; CONTENT_HASH_BYTES];
    out.copy_from_slice(&digest);
    ContentHash::from_bytes(out)
}
