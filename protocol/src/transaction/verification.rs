//! Transaction acceptance: every check a ledger node runs before admitting
//! a signed transaction.
//!
//! The individual checks all answer `bool`. [`verify_transaction`] chains
//! them, cheapest first, and reports which gate failed so callers can log
//! something more useful than "rejected".

use thiserror::Error;
use tracing::debug;

use super::address::validate_curve_membership;
use super::builder::Transaction;
use super::signing::{envelope_public_key, verify_signature};
use crate::zkp::ZkVerifier;

/// The first gate a transaction failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AcceptanceError {
    #[error("signature does not verify")]
    InvalidSignature,

    #[error("recipient is not a valid Ed25519 point")]
    RecipientNotOnCurve,

    #[error("transaction type requires a zk proof and public witness")]
    MissingProof,

    #[error("no zk verifier configured")]
    VerifierUnavailable,

    #[error("signature envelope carries no usable public key")]
    MissingEnvelopeKey,

    #[error("zk proof rejected")]
    InvalidProof,
}

/// Run all acceptance checks on `tx` and its `signature`.
///
/// In order:
///
/// 1. **Signature** over the canonical bytes, using the scheme the type
///    selects.
/// 2. **Curve membership** of the recipient for allow-listed user content.
/// 3. **Proof**, for types that require one: proof and witness must be
///    attached, and must verify against the sender and the base58 form of
///    the key in the signature envelope.
pub fn verify_transaction(
    tx: &Transaction,
    signature: &str,
    zk: Option<&ZkVerifier>,
) -> Result<(), AcceptanceError> {
    if !verify_signature(tx, signature) {
        return Err(AcceptanceError::InvalidSignature);
    }

    if !validate_curve_membership(tx) {
        return Err(AcceptanceError::RecipientNotOnCurve);
    }

    if tx.tx_type().requires_proof() {
        let (Some(proof), Some(witness)) = (tx.zk_proof(), tx.zk_pub()) else {
            return Err(AcceptanceError::MissingProof);
        };
        let zk = zk.ok_or(AcceptanceError::VerifierUnavailable)?;
        let public_key = envelope_public_key(signature)
            .ok_or(AcceptanceError::MissingEnvelopeKey)?
            .to_address();

        if !zk.verify_proof(tx.sender(), &public_key, proof, witness) {
            return Err(AcceptanceError::InvalidProof);
        }
    }

    debug!(tx_type = %tx.tx_type(), sender = tx.sender(), nonce = tx.nonce(), "transaction accepted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONTENT_TYPE_DONATION_CAMPAIGN_FEED;
    use crate::crypto::MmnKeypair;
    use crate::transaction::address::derive_address;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::signing::{sign_transaction, SignedTransaction};
    use crate::transaction::types::{ExtraInfo, TransactionType};
    use crate::zkp::{IdentityProver, ProofCacheConfig};
    use ark_bn254::Fr;
    use ark_ff::UniformRand;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use curve25519_dalek::edwards::CompressedEdwardsY;

    fn sign(tx: &Transaction, kp: &MmnKeypair) -> SignedTransaction {
        sign_transaction(tx, kp.public_key().as_bytes(), &kp.seed()).unwrap()
    }

    fn builder(tx_type: TransactionType, sender: &str) -> TransactionBuilder {
        TransactionBuilder::new(tx_type)
            .sender(sender)
            .recipient(&MmnKeypair::generate().address())
            .amount(1000u64)
            .nonce(1)
            .timestamp(1_700_000_000)
    }

    #[test]
    fn key_transfer_accepted() {
        let kp = MmnKeypair::generate();
        let tx = builder(TransactionType::TransferByKey, &kp.address()).build().unwrap();
        let signed = sign(&tx, &kp);
        assert_eq!(verify_transaction(&signed.tx, &signed.signature, None), Ok(()));
    }

    #[test]
    fn bad_signature_reported_first() {
        let kp = MmnKeypair::generate();
        let tx = builder(TransactionType::TransferByZk, &derive_address("u")).build().unwrap();
        assert_eq!(
            verify_transaction(&tx, "garbage", None),
            Err(AcceptanceError::InvalidSignature)
        );
        let signed = sign(&tx, &kp);
        assert_eq!(
            verify_transaction(&signed.tx, &signed.signature, None),
            Err(AcceptanceError::MissingProof)
        );
    }

    /// A 32-byte value with no matching point, found by scanning y.
    fn off_curve_address() -> String {
        let bytes = (1u8..=255)
            .map(|y| {
                let mut bytes = [0u8; 32];
                bytes[0] = y;
                bytes
            })
            .find(|b| CompressedEdwardsY(*b).decompress().is_none())
            .unwrap();
        bs58::encode(bytes).into_string()
    }

    fn campaign_post(recipient: &str) -> TransactionBuilder {
        let mut extra = ExtraInfo::new();
        extra.insert("type".into(), CONTENT_TYPE_DONATION_CAMPAIGN_FEED.into());
        builder(TransactionType::UserContent, &derive_address("u"))
            .recipient(recipient)
            .extra_info(extra)
    }

    #[test]
    fn off_curve_campaign_recipient_rejected() {
        let kp = MmnKeypair::generate();
        let tx = campaign_post(&off_curve_address()).build().unwrap();
        let signed = sign(&tx, &kp);
        assert_eq!(
            verify_transaction(&signed.tx, &signed.signature, None),
            Err(AcceptanceError::RecipientNotOnCurve)
        );
    }

    #[test]
    fn on_curve_campaign_recipient_accepted() {
        let kp = MmnKeypair::generate();
        let wallet = MmnKeypair::generate().address();
        let tx = campaign_post(&wallet).build().unwrap();
        let signed = sign(&tx, &kp);
        assert_eq!(verify_transaction(&signed.tx, &signed.signature, None), Ok(()));
    }

    #[test]
    fn zk_transfer_needs_verifier_and_valid_proof() {
        let mut rng = StdRng::seed_from_u64(1);
        let (prover, vk) = IdentityProver::setup(&mut rng).unwrap();
        let zk = ZkVerifier::from_verifying_key(vk.into_inner(), ProofCacheConfig::default())
            .unwrap();

        let kp = MmnKeypair::generate();
        let sender = derive_address("user-7");
        let proof = prover
            .prove(Fr::rand(&mut rng), 5, &sender, &kp.address())
            .unwrap();

        let tx = builder(TransactionType::TransferByZk, &sender)
            .zk_proof(&proof.proof_base64(), &proof.witness_base64())
            .build()
            .unwrap();
        let signed = sign(&tx, &kp);

        assert_eq!(
            verify_transaction(&signed.tx, &signed.signature, None),
            Err(AcceptanceError::VerifierUnavailable)
        );
        assert_eq!(
            verify_transaction(&signed.tx, &signed.signature, Some(&zk)),
            Ok(())
        );

        // Same proof, signed by a different key: the binding fails.
        let other = MmnKeypair::generate();
        let resigned = sign(&tx, &other);
        assert_eq!(
            verify_transaction(&resigned.tx, &resigned.signature, Some(&zk)),
            Err(AcceptanceError::InvalidProof)
        );
    }
}
