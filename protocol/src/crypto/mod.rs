//! # Cryptographic Primitives
//!
//! Thin, type-safe wrappers around audited implementations: Ed25519 from
//! `ed25519-dalek` for every signature, SHA-256 for address derivation and
//! BLAKE3 for internal keying. Nothing here is hand-rolled.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, sha256};
pub use keys::{MmnKeypair, MmnPublicKey, MmnSignature};
pub use signatures::{sign, verify, verify_raw};
