//! # Identity Binding R1CS Circuit
//!
//! The statement being proved:
//!
//! ```text
//! "I know `secret` such that:
//!     1. (secret + sender) * (secret + public_key) = commitment
//!     2. nonce != 0"
//! ```
//!
//! `sender` and `public_key` are public inputs, so a proof is only valid for
//! the exact sender address and signing key it was made for. The verifier
//! recomputes both from the transaction and compares them before running
//! the pairing check.
//!
//! The product form keeps the commitment to one multiplication gate, and
//! the non-zero nonce costs one inverse witness.

use ark_bn254::Fr;
use ark_ff::Field;
use ark_r1cs_std::{
    alloc::AllocVar,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::field_from_bytes;

/// Groth16 circuit binding an identity secret to a sender and signing key.
///
/// All fields are `Option<_>` so the struct can be built empty for key
/// generation, where only the constraint topology matters.
#[derive(Clone, Default)]
pub struct IdentityBindingCircuit {
    // -- Private witness ----------------------------------------------------
    pub secret: Option<Fr>,

    // -- Public inputs, in allocation order ---------------------------------
    pub commitment: Option<Fr>,
    pub nonce: Option<Fr>,
    pub public_key: Option<Fr>,
    pub sender: Option<Fr>,
}

impl IdentityBindingCircuit {
    /// A fully populated circuit for proof generation.
    pub fn new(secret: Fr, nonce: u64, sender: &str, public_key: &str) -> Self {
        let sender = field_from_bytes(sender.as_bytes());
        let public_key = field_from_bytes(public_key.as_bytes());
        Self {
            secret: Some(secret),
            commitment: Some(commitment(secret, sender, public_key)),
            nonce: Some(Fr::from(nonce)),
            public_key: Some(public_key),
            sender: Some(sender),
        }
    }

    /// An empty circuit for CRS generation.
    pub fn blank() -> Self {
        Self::default()
    }

    /// The public input vector, in the order the verifier expects. `None`
    /// for a blank circuit.
    pub fn public_inputs(&self) -> Option<Vec<Fr>> {
        Some(vec![
            self.commitment?,
            self.nonce?,
            self.public_key?,
            self.sender?,
        ])
    }
}

/// `(secret + sender) * (secret + public_key)`.
pub fn commitment(secret: Fr, sender: Fr, public_key: Fr) -> Fr {
    (secret + sender) * (secret + public_key)
}

impl ConstraintSynthesizer<Fr> for IdentityBindingCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // Public inputs. Allocation order fixes their index in the vector.
        let commitment_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "commitment"), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nonce_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "nonce"), || {
            self.nonce.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let public_key_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "public_key"), || {
            self.public_key.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let sender_var = FpVar::<Fr>::new_input(ark_relations::ns!(cs, "sender"), || {
            self.sender.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let secret_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "secret"), || {
            self.secret.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let computed = (&secret_var + &sender_var) * (&secret_var + &public_key_var);
        computed.enforce_equal(&commitment_var)?;

        // nonce != 0  <=>  nonce has an inverse.
        let nonce_inv = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "nonce_inv"), || {
            let nonce = self.nonce.ok_or(SynthesisError::AssignmentMissing)?;
            Ok(nonce.inverse().unwrap_or_default())
        })?;
        (&nonce_var * &nonce_inv).enforce_equal(&FpVar::one())?;

        Ok(())
    }
}
