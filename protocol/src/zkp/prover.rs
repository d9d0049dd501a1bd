//! # Groth16 Proof Generation
//!
//! Client side of the identity binding proof. Production clients prove with
//! their own tooling; this prover exists so that tests, benches and local
//! networks can produce real proofs and a matching verifying key.
//!
//! 1. **Setup**: [`IdentityProver::setup`] runs a local trusted setup and
//!    returns the prover plus an [`IdentityVerifyingKey`], which can be
//!    written to the file [`ZkVerifier::load`](super::ZkVerifier::load)
//!    reads.
//! 2. **Prove**: [`IdentityProver::prove`] fills an
//!    [`IdentityBindingCircuit`] and returns an [`IdentityProof`] whose
//!    proof and witness are already in their base64 wire form.
//!
//! The proving key can be saved with [`IdentityProver::write_to_file`] and
//! read back with [`IdentityProver::load`], so setup and proving can happen
//! in different processes.

use anyhow::{bail, Context, Result};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, Rng};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::Path;

use super::circuit::IdentityBindingCircuit;
use super::witness::encode_public_witness;

// ---------------------------------------------------------------------------
// IdentityProver
// ---------------------------------------------------------------------------

/// Holds the Groth16 proving key for the identity binding circuit.
pub struct IdentityProver {
    pk: ProvingKey<Bn254>,
}

impl IdentityProver {
    /// Run a local trusted setup. Not an MPC ceremony: whoever runs this can
    /// forge proofs, so it is for tests and private networks only.
    pub fn setup<R: Rng + CryptoRng>(rng: &mut R) -> Result<(Self, IdentityVerifyingKey)> {
        let (pk, vk) =
            Groth16::<Bn254>::circuit_specific_setup(IdentityBindingCircuit::blank(), rng)
                .context("Groth16 setup failed for the identity binding circuit")?;
        Ok((Self { pk }, IdentityVerifyingKey { vk }))
    }

    /// Read a proving key written by [`write_to_file`](Self::write_to_file).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let encoded = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read proving key from {}", path.display()))?;
        let bytes = BASE64
            .decode(encoded.trim())
            .context("proving key is not valid base64")?;
        let pk = ProvingKey::<Bn254>::deserialize_compressed(bytes.as_slice())
            .context("proving key is not a BN254 Groth16 key")?;
        Ok(Self { pk })
    }

    /// Base64 of the compressed proving key. Anyone holding this file can
    /// prove for any identity.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut buf = Vec::new();
        self.pk
            .serialize_compressed(&mut buf)
            .context("proving key serialization failed")?;
        std::fs::write(path, BASE64.encode(buf))
            .with_context(|| format!("failed to write proving key to {}", path.display()))
    }

    /// Prove knowledge of `secret` for this sender and signing key.
    ///
    /// `sender` and `public_key` must be exactly the strings the verifier
    /// will see: the transaction's sender address and the base58 signer key.
    pub fn prove(
        &self,
        secret: Fr,
        nonce: u64,
        sender: &str,
        public_key: &str,
    ) -> Result<IdentityProof> {
        // ark-groth16 panics on an unsatisfiable witness rather than
        // returning Err, so reject the one input that can cause it.
        if nonce == 0 {
            bail!("nonce must be non-zero");
        }

        let circuit = IdentityBindingCircuit::new(secret, nonce, sender, public_key);
        let public_inputs = circuit
            .public_inputs()
            .context("populated circuit is missing public inputs")?;

        let mut rng = ark_std::rand::thread_rng();
        let proof = Groth16::<Bn254>::prove(&self.pk, circuit, &mut rng)
            .context("Groth16 proof generation failed")?;

        let mut proof_bytes = Vec::new();
        proof
            .serialize_compressed(&mut proof_bytes)
            .context("proof serialization failed")?;

        Ok(IdentityProof {
            proof_bytes,
            witness_bytes: encode_public_witness(&public_inputs),
            public_inputs,
        })
    }
}

// ---------------------------------------------------------------------------
// IdentityVerifyingKey
// ---------------------------------------------------------------------------

/// Verifying key produced by [`IdentityProver::setup`].
#[derive(Clone)]
pub struct IdentityVerifyingKey {
    vk: VerifyingKey<Bn254>,
}

impl IdentityVerifyingKey {
    pub fn inner(&self) -> &VerifyingKey<Bn254> {
        &self.vk
    }

    pub fn into_inner(self) -> VerifyingKey<Bn254> {
        self.vk
    }

    /// Compressed arkworks encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.vk
            .serialize_compressed(&mut buf)
            .context("verifying key serialization failed")?;
        Ok(buf)
    }

    /// The verifying-key file format: base64 of the compressed key.
    pub fn to_base64(&self) -> Result<String> {
        Ok(BASE64.encode(self.to_bytes()?))
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_base64()?)
            .with_context(|| format!("failed to write verifying key to {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// IdentityProof
// ---------------------------------------------------------------------------

/// A proof together with the public witness it was made for.
#[derive(Clone, Debug)]
pub struct IdentityProof {
    proof_bytes: Vec<u8>,
    witness_bytes: Vec<u8>,
    public_inputs: Vec<Fr>,
}

impl IdentityProof {
    pub fn proof_bytes(&self) -> &[u8] {
        &self.proof_bytes
    }

    pub fn witness_bytes(&self) -> &[u8] {
        &self.witness_bytes
    }

    pub fn public_inputs(&self) -> &[Fr] {
        &self.public_inputs
    }

    /// Value for a transaction's `zk_proof` field.
    pub fn proof_base64(&self) -> String {
        BASE64.encode(&self.proof_bytes)
    }

    /// Value for a transaction's `zk_pub` field.
    pub fn witness_base64(&self) -> String {
        BASE64.encode(&self.witness_bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
