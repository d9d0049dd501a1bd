//! # Digital Signatures
//!
//! Ed25519 signing and verification entry points. Transaction code never
//! talks to `ed25519-dalek` directly; it goes through [`sign`] and
//! [`verify_raw`], which gives one place to audit every signature check.
//!
//! Verification is total: malformed keys, wrong lengths and bad signatures
//! all come back as `false`. Callers on the wire path feed attacker-chosen
//! bytes straight in, so nothing here may panic.

use super::keys::{MmnKeypair, MmnPublicKey, MmnSignature};
use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Sign a message with an account keypair.
///
/// ```
/// use mmn_protocol::crypto::{MmnKeypair, sign, verify};
///
/// let keypair = MmnKeypair::generate();
/// let signature = sign(&keypair, b"send 100 to alice");
/// assert!(verify(&keypair.public_key(), b"send 100 to alice", &signature));
/// ```
pub fn sign(keypair: &MmnKeypair, message: &[u8]) -> MmnSignature {
    keypair.sign(message)
}

/// Verify a typed signature against a typed public key.
pub fn verify(public_key: &MmnPublicKey, message: &[u8], signature: &MmnSignature) -> bool {
    public_key.verify(message, signature)
}

/// Verify a signature given as raw byte slices straight off the wire.
///
/// Returns `false` unless the key is exactly 32 bytes, the signature is
/// exactly 64 bytes and the signature checks out.
pub fn verify_raw(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    if public_key.len() != PUBLIC_KEY_LENGTH || signature.len() != SIGNATURE_LENGTH {
        return false;
    }
    let (Ok(public_key), Ok(signature)) = (
        MmnPublicKey::try_from_slice(public_key),
        MmnSignature::try_from_slice(signature),
    ) else {
        return false;
    };
    verify(&public_key, message, &signature)
}
