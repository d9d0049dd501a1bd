//! Transaction signing and signature verification.
//!
//! Signing is a separate step from building because the key may not be
//! available at construction time. The message is always
//! [`Transaction::canonical_bytes`].
//!
//! Two signature layouts exist, picked by the transaction type:
//!
//! - **Direct** (`TransferByKey`): `base58(signature)`. The verifying key is
//!   the sender address itself.
//! - **Enveloped** (everything else): `base58(json)` of a [`UserSignature`]
//!   carrying the signer's public key next to the signature. The sender of
//!   these transactions is typically a derived address with no key behind
//!   it, so the key has to travel with the signature.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::builder::Transaction;
use super::types::SignatureScheme;
use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::keys::{MmnKeypair, MmnPublicKey};
use crate::crypto::signatures::verify_raw;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SigningError {
    /// The private key is not a raw 32-byte Ed25519 seed.
    #[error("unsupported private key: expected a 32-byte Ed25519 seed, got {got} bytes")]
    UnsupportedKey { got: usize },

    /// The public key to embed in an envelope is not 32 bytes.
    #[error("invalid signer public key: expected 32 bytes, got {got}")]
    InvalidPublicKey { got: usize },

    #[error("failed to encode signature envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A transaction together with its signature, as submitted to a ledger node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(rename = "tx_msg")]
    pub tx: Transaction,
    pub signature: String,
}

/// Signature envelope for the enveloped scheme.
///
/// JSON form is `{"PubKey": "<base64>", "Sig": "<base64>"}`, matching what
/// ledger nodes decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSignature {
    #[serde(rename = "PubKey", with = "base64_bytes")]
    pub pub_key: Vec<u8>,
    #[serde(rename = "Sig", with = "base64_bytes")]
    pub sig: Vec<u8>,
}

impl UserSignature {
    /// `base58(json(self))`.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(bs58::encode(json).into_string())
    }

    /// Inverse of [`encode`](Self::encode). Lengths are not checked here.
    pub fn decode(signature: &str) -> Option<Self> {
        let json = bs58::decode(signature).into_vec().ok()?;
        serde_json::from_slice(&json).ok()
    }
}

mod base64_bytes {
    use super::{Engine, BASE64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Sign `tx` with a raw 32-byte Ed25519 seed.
///
/// `signer_public_key` is only used by the enveloped scheme, where it is
/// embedded verbatim. It is not checked against the seed; a mismatch simply
/// produces a signature that will not verify.
///
/// ```
/// use mmn_protocol::crypto::MmnKeypair;
/// use mmn_protocol::transaction::{sign_transaction, verify_signature};
/// use mmn_protocol::transaction::{TransactionBuilder, TransactionType};
///
/// let kp = MmnKeypair::generate();
/// let tx = TransactionBuilder::new(TransactionType::TransferByKey)
///     .sender(&kp.address())
///     .recipient(&MmnKeypair::generate().address())
///     .amount(1000u64)
///     .nonce(1)
///     .build()
///     .unwrap();
///
/// let signed = sign_transaction(&tx, kp.public_key().as_bytes(), &kp.seed()).unwrap();
/// assert!(verify_signature(&signed.tx, &signed.signature));
/// ```
pub fn sign_transaction(
    tx: &Transaction,
    signer_public_key: &[u8],
    seed: &[u8],
) -> Result<SignedTransaction, SigningError> {
    let keypair =
        MmnKeypair::from_seed_slice(seed).map_err(|_| SigningError::UnsupportedKey { got: seed.len() })?;
    let signature = keypair.sign(&tx.canonical_bytes());

    let encoded = match tx.tx_type().signature_scheme() {
        SignatureScheme::Direct => signature.to_base58(),
        SignatureScheme::Enveloped => {
            if signer_public_key.len() != PUBLIC_KEY_LENGTH {
                return Err(SigningError::InvalidPublicKey {
                    got: signer_public_key.len(),
                });
            }
            UserSignature {
                pub_key: signer_public_key.to_vec(),
                sig: signature.as_bytes().to_vec(),
            }
            .encode()?
        }
    };

    Ok(SignedTransaction {
        tx: tx.clone(),
        signature: encoded,
    })
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Check `signature` over `tx`. Every malformed input yields `false`.
pub fn verify_signature(tx: &Transaction, signature: &str) -> bool {
    let message = tx.canonical_bytes();

    let valid = match tx.tx_type().signature_scheme() {
        SignatureScheme::Direct => {
            let Ok(public_key) = bs58::decode(tx.sender()).into_vec() else {
                return false;
            };
            let Ok(sig) = bs58::decode(signature).into_vec() else {
                return false;
            };
            verify_raw(&public_key, &message, &sig)
        }
        SignatureScheme::Enveloped => match UserSignature::decode(signature) {
            Some(envelope) => verify_raw(&envelope.pub_key, &message, &envelope.sig),
            None => false,
        },
    };

    if !valid {
        debug!(tx_type = %tx.tx_type(), sender = tx.sender(), "signature rejected");
    }
    valid
}

/// The public key embedded in an enveloped signature, if it is well-formed.
pub fn envelope_public_key(signature: &str) -> Option<MmnPublicKey> {
    let envelope = UserSignature::decode(signature)?;
    if envelope.sig.len() != SIGNATURE_LENGTH {
        return None;
    }
    MmnPublicKey::try_from_slice(&envelope.pub_key).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::address::derive_address;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::TransactionType;

    const ALL_TYPES: [TransactionType; 3] = [
        TransactionType::TransferByZk,
        TransactionType::TransferByKey,
        TransactionType::UserContent,
    ];

    fn tx_for(tx_type: TransactionType, signer: &MmnKeypair) -> Transaction {
        // Direct-scheme senders are the key's own address; the others use a
        // derived address.
        let sender = match tx_type.signature_scheme() {
            SignatureScheme::Direct => signer.address(),
            SignatureScheme::Enveloped => derive_address("user-1"),
        };
        TransactionBuilder::new(tx_type)
            .sender(&sender)
            .recipient(&MmnKeypair::from_seed(&[9u8; 32]).address())
            .amount(1000u64)
            .nonce(7)
            .timestamp(1_700_000_000)
            .text_data("memo")
            .build()
            .unwrap()
    }

    fn sign(tx: &Transaction, kp: &MmnKeypair) -> SignedTransaction {
        sign_transaction(tx, kp.public_key().as_bytes(), &kp.seed()).unwrap()
    }

    #[test]
    fn sign_verify_roundtrip_every_type() {
        let kp = MmnKeypair::generate();
        for t in ALL_TYPES {
            let tx = tx_for(t, &kp);
            let signed = sign(&tx, &kp);
            assert!(verify_signature(&signed.tx, &signed.signature), "{t}");
        }
    }

    #[test]
    fn direct_signature_is_plain_base58() {
        let kp = MmnKeypair::generate();
        let signed = sign(&tx_for(TransactionType::TransferByKey, &kp), &kp);
        let raw = bs58::decode(&signed.signature).into_vec().unwrap();
        assert_eq!(raw.len(), SIGNATURE_LENGTH);
    }

    #[test]
    fn envelope_carries_key_and_signature() {
        let kp = MmnKeypair::generate();
        let signed = sign(&tx_for(TransactionType::UserContent, &kp), &kp);

        let json = bs58::decode(&signed.signature).into_vec().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["PubKey"], BASE64.encode(kp.public_key().as_bytes()));
        assert!(value["Sig"].is_string());

        assert_eq!(envelope_public_key(&signed.signature), Some(kp.public_key()));
    }

    #[test]
    fn tampering_breaks_direct_signature() {
        let kp = MmnKeypair::generate();
        let tx = tx_for(TransactionType::TransferByKey, &kp);
        let signed = sign(&tx, &kp);

        let tampered = [
            tx.to_builder().amount(1001u64).build().unwrap(),
            tx.to_builder().nonce(8).build().unwrap(),
            tx.to_builder().text_data("memo!").build().unwrap(),
            tx.to_builder()
                .recipient(&MmnKeypair::generate().address())
                .build()
                .unwrap(),
        ];
        for t in &tampered {
            assert!(!verify_signature(t, &signed.signature));
        }
    }

    #[test]
    fn envelope_key_substitution_fails() {
        let kp = MmnKeypair::generate();
        let attacker = MmnKeypair::generate();
        let tx = tx_for(TransactionType::UserContent, &kp);
        let signed = sign(&tx, &kp);

        let mut envelope = UserSignature::decode(&signed.signature).unwrap();
        envelope.pub_key = attacker.public_key().as_bytes().to_vec();
        assert!(!verify_signature(&tx, &envelope.encode().unwrap()));
    }

    #[test]
    fn short_seed_is_unsupported() {
        let kp = MmnKeypair::generate();
        let tx = tx_for(TransactionType::TransferByKey, &kp);
        let err = sign_transaction(&tx, kp.public_key().as_bytes(), &[1u8; 31]).unwrap_err();
        assert!(matches!(err, SigningError::UnsupportedKey { got: 31 }));

        // A 64-byte expanded key is not accepted either.
        let err = sign_transaction(&tx, kp.public_key().as_bytes(), &[1u8; 64]).unwrap_err();
        assert!(matches!(err, SigningError::UnsupportedKey { got: 64 }));
    }

    #[test]
    fn enveloped_requires_32_byte_public_key() {
        let kp = MmnKeypair::generate();
        let tx = tx_for(TransactionType::UserContent, &kp);
        let err = sign_transaction(&tx, &[0u8; 16], &kp.seed()).unwrap_err();
        assert!(matches!(err, SigningError::InvalidPublicKey { got: 16 }));
    }

    #[test]
    fn garbage_signatures_are_rejected() {
        let kp = MmnKeypair::generate();
        for t in ALL_TYPES {
            let tx = tx_for(t, &kp);
            for sig in ["", "0OIl", "1111", "3mJr7AoUXx2Wqd"] {
                assert!(!verify_signature(&tx, sig));
            }
        }
    }

    #[test]
    fn envelope_with_wrong_lengths_is_rejected() {
        let kp = MmnKeypair::generate();
        let tx = tx_for(TransactionType::UserContent, &kp);
        let signed = sign(&tx, &kp);
        let mut envelope = UserSignature::decode(&signed.signature).unwrap();
        envelope.sig.truncate(63);
        let encoded = envelope.encode().unwrap();
        assert!(!verify_signature(&tx, &encoded));
        assert_eq!(envelope_public_key(&encoded), None);
    }

    #[test]
    fn signed_transaction_wire_names() {
        let kp = MmnKeypair::generate();
        let signed = sign(&tx_for(TransactionType::TransferByKey, &kp), &kp);
        let json = serde_json::to_value(&signed).unwrap();
        assert!(json.get("tx_msg").is_some());
        assert_eq!(json["signature"], signed.signature.as_str());
        let back: SignedTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, signed);
    }
}
