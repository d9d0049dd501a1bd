//! Core type definitions for MMN transactions.
//!
//! The type tag, the amount representation and the extra-info payload are
//! all part of the signed bytes, so their textual forms here are wire
//! format, not presentation.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{MAX_AMOUNT_BITS, NATIVE_DECIMALS};

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// Serialized as its integer code, which is also what goes into the
/// canonical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TransactionType {
    /// Transfer authorized by a zero-knowledge identity proof. The on-chain
    /// sender is derived from a user id, so the signing key travels in an
    /// envelope.
    TransferByZk,
    /// Transfer signed directly by the key whose address is the sender.
    /// Faucet disbursements use this code too; see [`Self::FAUCET`].
    TransferByKey,
    /// User-generated content (feed posts, campaign updates) that may carry
    /// value to the recipient.
    UserContent,
}

/// How a transaction's signature field is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// base58(raw signature); the verifier takes the key from the sender
    /// address.
    Direct,
    /// base58(JSON envelope carrying the signer key and the signature).
    Enveloped,
}

impl TransactionType {
    /// Older SDKs call code 1 "faucet". It is the same wire type, signed
    /// with the direct scheme by the faucet account.
    pub const FAUCET: Self = Self::TransferByKey;

    pub fn code(self) -> i32 {
        match self {
            Self::TransferByZk => 0,
            Self::TransferByKey => 1,
            Self::UserContent => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::TransferByZk),
            1 => Some(Self::TransferByKey),
            2 => Some(Self::UserContent),
            _ => None,
        }
    }

    /// The signing scheme is a pure function of the type tag.
    pub fn signature_scheme(self) -> SignatureScheme {
        match self {
            Self::TransferByKey => SignatureScheme::Direct,
            Self::TransferByZk | Self::UserContent => SignatureScheme::Enveloped,
        }
    }

    /// Whether acceptance additionally requires a zero-knowledge proof.
    pub fn requires_proof(self) -> bool {
        matches!(self, Self::TransferByZk)
    }
}

impl From<TransactionType> for i32 {
    fn from(tx_type: TransactionType) -> Self {
        tx_type.code()
    }
}

impl TryFrom<i32> for TransactionType {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown transaction type {code}"))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferByZk => write!(f, "TransferByZk"),
            Self::TransferByKey => write!(f, "TransferByKey"),
            Self::UserContent => write!(f, "UserContent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is not a decimal integer: {0:?}")]
    NotDecimal(String),

    #[error("amount exceeds 256 bits")]
    Overflow,
}

/// A token amount in base units: an unsigned integer of up to 256 bits.
///
/// Serialized as a decimal string, the same form the canonical bytes use.
/// No floating point anywhere near money.
///
/// ```
/// use mmn_protocol::transaction::types::Amount;
///
/// let amount: Amount = "1000000000000".parse().unwrap();
/// assert_eq!(amount.to_string(), "1000000000000");
/// assert_eq!(Amount::from_tokens(3).unwrap().to_string(), "3000000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigUint);

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    /// Build from a big integer, rejecting anything wider than 256 bits.
    pub fn from_biguint(value: BigUint) -> Result<Self, AmountError> {
        if value.bits() > MAX_AMOUNT_BITS {
            return Err(AmountError::Overflow);
        }
        Ok(Self(value))
    }

    /// Whole tokens scaled to base units (`tokens * 10^6`).
    pub fn from_tokens(tokens: u64) -> Result<Self, AmountError> {
        Self::from_biguint(BigUint::from(tokens) * BigUint::from(10u32).pow(NATIVE_DECIMALS))
    }

    pub fn is_zero(&self) -> bool {
        self.0.bits() == 0
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // BigUint accepts a leading '+', and underscores in some versions;
        // the canonical form is plain ASCII digits only.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::NotDecimal(s.to_string()));
        }
        let value = BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| AmountError::NotDecimal(s.to_string()))?;
        Self::from_biguint(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Extra info
// ---------------------------------------------------------------------------

/// Application-defined key/value metadata attached to a transaction.
/// A `BTreeMap` so the JSON form has sorted keys and is deterministic.
pub type ExtraInfo = BTreeMap<String, String>;

/// Serialize extra info to the JSON string stored on the transaction.
/// `None` becomes `""`; an empty map becomes `"{}"`.
pub fn serialize_extra_info(extra: Option<&ExtraInfo>) -> String {
    match extra {
        // Serializing a map of strings to JSON cannot fail.
        Some(map) => serde_json::to_string(map).unwrap_or_default(),
        None => String::new(),
    }
}

/// Parse the stored extra-info string back into a map. `""` is `None`.
pub fn deserialize_extra_info(raw: &str) -> Result<Option<ExtraInfo>, serde_json::Error> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw).map(Some)
}

/// The part of a user-content extra-info payload that decides routing.
/// Other keys, whatever their JSON type, are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserContent {
    #[serde(rename = "type", default)]
    pub content_type: String,
}

impl UserContent {
    /// Read the routing fields out of a stored extra-info string. `""` is
    /// `None`.
    pub fn from_extra_info(raw: &str) -> Result<Option<Self>, serde_json::Error> {
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(raw).map(Some)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
