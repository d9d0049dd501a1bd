//! # Zero-Knowledge Proof Module
//!
//! Groth16 over BN254, used to authorize `TransferByZk` transactions. The
//! statement a client proves binds an off-chain identity to the on-chain
//! sender and the ephemeral public key that signs the transaction.
//!
//! ## Architecture
//!
//! ```text
//! circuit.rs  — IdentityBindingCircuit (R1CS) and its public-input layout
//! prover.rs   — trusted setup and proof generation (tests, local networks)
//! witness.rs  — public witness binary codec
//! cache.rs    — sharded, time-bounded verdict cache
//! verifier.rs — ZkVerifier: identity binding + cached Groth16 verification
//! ```
//!
//! ## Public inputs (in order)
//!
//! | index | value |
//! |-------|-------|
//! | 0     | identity commitment |
//! | 1     | nonce |
//! | 2     | signer public key, as a field element |
//! | 3     | sender address, as a field element |
//!
//! Strings map to field elements by reading their UTF-8 bytes as a
//! big-endian integer reduced mod r. See [`field_from_bytes`].

use ark_bn254::Fr;
use ark_ff::PrimeField;

pub mod cache;
pub mod circuit;
pub mod prover;
pub mod verifier;
pub mod witness;

pub use cache::{ProofCache, ProofCacheConfig};
pub use circuit::IdentityBindingCircuit;
pub use prover::{IdentityProof, IdentityProver, IdentityVerifyingKey};
pub use verifier::{VerifierStats, ZkSetupError, ZkVerifier};

/// Map arbitrary bytes to a scalar: big-endian integer, reduced mod r.
pub fn field_from_bytes(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn field_mapping_is_big_endian() {
        assert_eq!(field_from_bytes(&[0x01, 0x00]), Fr::from(256u64));
        assert_eq!(field_from_bytes(b""), Fr::from(0u64));
        assert_ne!(field_from_bytes(b"alice"), field_from_bytes(b"bob"));
    }

    /// setup -> prove -> write key -> load -> verify.
    #[test]
    fn end_to_end_identity_proof() {
        let mut rng = StdRng::seed_from_u64(42);
        let (prover, vk) = IdentityProver::setup(&mut rng).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verifying.key");
        vk.write_to_file(&path).unwrap();
        let verifier = ZkVerifier::load(&path, ProofCacheConfig::default()).unwrap();

        let secret = Fr::rand(&mut rng);
        let proof = prover.prove(secret, 7, "sender-address", "signer-key").unwrap();

        assert!(verifier.verify_proof(
            "sender-address",
            "signer-key",
            &proof.proof_base64(),
            &proof.witness_base64(),
        ));
        assert!(!verifier.verify_proof(
            "someone-else",
            "signer-key",
            &proof.proof_base64(),
            &proof.witness_base64(),
        ));
    }
}
