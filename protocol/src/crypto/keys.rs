//! # Key Management
//!
//! Ed25519 keypair handling for MMN accounts.
//!
//! An MMN address is the base58 encoding of a raw 32-byte Ed25519 public
//! key, so the same bytes serve as account identifier and verification key.
//! Wallets hand us secret material either as a raw 32-byte seed or as the
//! 48-byte PKCS#8 DER blob that most key tooling exports; both end up here.
//!
//! Key bytes are never logged. `Debug` on a keypair prints only the public
//! half.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{PUBLIC_KEY_LENGTH, SEED_LENGTH, SIGNATURE_LENGTH};

/// DER prefix of a PKCS#8 v1 Ed25519 private key (RFC 8410). The 32-byte
/// seed follows it directly.
const PKCS8_ED25519_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

/// Errors that can occur during key operations.
///
/// These never include key bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("unsupported private key length: expected {expected} bytes, got {got}")]
    UnsupportedKeyLength { expected: usize, got: usize },

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,

    #[error("malformed PKCS#8 Ed25519 private key")]
    MalformedPkcs8,

    #[error("invalid base58 encoding")]
    InvalidBase58,
}

/// An account keypair wrapping an Ed25519 signing key.
///
/// Intentionally not `Serialize`. Exporting secret material goes through
/// [`MmnKeypair::seed`] so it is always a deliberate call.
///
/// ```
/// use mmn_protocol::crypto::keys::MmnKeypair;
///
/// let kp = MmnKeypair::generate();
/// let sig = kp.sign(b"transfer 1000 to bob");
/// assert!(kp.public_key().verify(b"transfer 1000 to bob", &sig));
/// ```
pub struct MmnKeypair {
    signing_key: SigningKey,
}

/// The public half of an account. Its base58 form is the account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MmnPublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct MmnSignature {
    bytes: [u8; SIGNATURE_LENGTH],
}

impl MmnKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Construct a keypair from seed bytes of unchecked length.
    ///
    /// Only the exact seed length is supported. Expanded 64-byte secret keys
    /// and DER blobs must be reduced to the seed by the caller (see
    /// [`seed_from_pkcs8_der`]).
    pub fn from_seed_slice(seed: &[u8]) -> Result<Self, KeyError> {
        let seed: &[u8; SEED_LENGTH] =
            seed.try_into().map_err(|_| KeyError::UnsupportedKeyLength {
                expected: SEED_LENGTH,
                got: seed.len(),
            })?;
        Ok(Self::from_seed(seed))
    }

    /// Construct a keypair from a hex-encoded PKCS#8 DER private key, the
    /// format wallet backends export.
    pub fn from_pkcs8_hex(der_hex: &str) -> Result<Self, KeyError> {
        let der = hex::decode(der_hex).map_err(|_| KeyError::MalformedPkcs8)?;
        let seed = seed_from_pkcs8_der(&der)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key(&self) -> MmnPublicKey {
        MmnPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// The account address: base58 of the public key.
    pub fn address(&self) -> String {
        self.public_key().to_address()
    }

    /// Sign a message. Ed25519 signatures are deterministic (RFC 8032).
    pub fn sign(&self, message: &[u8]) -> MmnSignature {
        MmnSignature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Export the raw 32-byte seed. Handle with care.
    pub fn seed(&self) -> [u8; SEED_LENGTH] {
        self.signing_key.to_bytes()
    }
}

impl Clone for MmnKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for MmnKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MmnKeypair(pub={})", self.address())
    }
}

/// Extract the Ed25519 seed from a PKCS#8 DER private key.
pub fn seed_from_pkcs8_der(der: &[u8]) -> Result<[u8; SEED_LENGTH], KeyError> {
    if der.len() != PKCS8_ED25519_PREFIX.len() + SEED_LENGTH || !der.starts_with(&PKCS8_ED25519_PREFIX)
    {
        return Err(KeyError::MalformedPkcs8);
    }
    let mut seed = [0u8; SEED_LENGTH];
    seed.copy_from_slice(&der[PKCS8_ED25519_PREFIX.len()..]);
    Ok(seed)
}

// ---------------------------------------------------------------------------
// MmnPublicKey
// ---------------------------------------------------------------------------

impl MmnPublicKey {
    /// Wrap raw bytes without checking that they are a curve point.
    /// [`MmnPublicKey::verify`] rejects non-points anyway.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Build from a slice, requiring exact length and a decodable point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parse a base58 account address into a public key.
    pub fn from_address(address: &str) -> Result<Self, KeyError> {
        let decoded = bs58::decode(address)
            .into_vec()
            .map_err(|_| KeyError::InvalidBase58)?;
        Self::try_from_slice(&decoded)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    pub fn to_address(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }

    /// Verify a signature against this key. Any failure, including bytes
    /// that do not decode to a point, is just `false`.
    pub fn verify(&self, message: &[u8], signature: &MmnSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &sig).is_ok()
    }
}

impl fmt::Display for MmnPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl fmt::Debug for MmnPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MmnPublicKey({})", self.to_address())
    }
}

// ---------------------------------------------------------------------------
// MmnSignature
// ---------------------------------------------------------------------------

impl MmnSignature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { bytes }
    }

    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl fmt::Debug for MmnSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = hex::encode(self.bytes);
        write!(f, "MmnSignature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}
