//! # Hashing Utilities
//!
//! Two hash functions, each with one job:
//!
//! - **SHA-256** derives account addresses from opaque user ids. Other SDKs
//!   derive the same addresses, so this one is about compatibility.
//! - **BLAKE3** spreads proof-cache keys across shards. Nothing outside the
//!   process ever sees these digests.

use sha2::{Digest, Sha256};

/// SHA-256 digest as a fixed-size array.
///
/// ```
/// use mmn_protocol::crypto::sha256;
///
/// assert_eq!(sha256(b"mmn").len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// BLAKE3 digest as a fixed-size array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}
