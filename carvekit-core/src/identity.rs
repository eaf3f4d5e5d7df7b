//! Content identity for canonical contexts

use sha2::{Digest, Sha256};

/// SHA-256 content hash used as the deduplication key.
pub type ContentHash = [u8; 32];

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Hex-encoded SHA-256 of a canonical context string.
pub fn content_hash_hex(content: &str) -> String {
    hex::encode(compute_content_hash(content.as_bytes()))
}
