//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] is the only way to obtain a [`Transaction`]:
//! both addresses are validated and the amount must be strictly positive
//! before a value exists. Deserialization goes through the same checks, so
//! a `Transaction` in hand is always well-formed.
//!
//! The builder does not sign. That happens in [`super::signing`], which
//! keeps construction testable without key material.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::address::{validate_address_format, AddressError};
use super::canonical;
use super::types::{serialize_extra_info, Amount, ExtraInfo, TransactionType};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a transaction cannot be constructed. The caller must not submit
/// anything after one of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("sender: {0}")]
    InvalidSender(AddressError),

    #[error("recipient: {0}")]
    InvalidRecipient(AddressError),

    #[error("amount must be > 0")]
    InvalidAmount,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An MMN transaction.
///
/// Immutable once built: fields are private and only readable. To derive a
/// modified transaction, go back through [`Transaction::to_builder`].
///
/// Wire field names match the ledger's JSON-RPC `TxMsg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    #[serde(rename = "type")]
    tx_type: TransactionType,
    sender: String,
    recipient: String,
    amount: Amount,
    timestamp: u64,
    text_data: String,
    nonce: u64,
    extra_info: String,
    zk_proof: String,
    zk_pub: String,
}

/// Unvalidated wire form of [`Transaction`].
#[derive(Deserialize)]
struct RawTransaction {
    #[serde(rename = "type")]
    tx_type: TransactionType,
    sender: String,
    recipient: String,
    amount: Amount,
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    text_data: String,
    #[serde(default)]
    nonce: u64,
    #[serde(default)]
    extra_info: String,
    #[serde(default)]
    zk_proof: String,
    #[serde(default)]
    zk_pub: String,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = BuildError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let tx = Transaction {
            tx_type: raw.tx_type,
            sender: raw.sender,
            recipient: raw.recipient,
            amount: raw.amount,
            timestamp: raw.timestamp,
            text_data: raw.text_data,
            nonce: raw.nonce,
            extra_info: raw.extra_info,
            zk_proof: raw.zk_proof,
            zk_pub: raw.zk_pub,
        };
        tx.validate()?;
        Ok(tx)
    }
}

impl Transaction {
    fn validate(&self) -> Result<(), BuildError> {
        validate_address_format(&self.sender).map_err(BuildError::InvalidSender)?;
        validate_address_format(&self.recipient).map_err(BuildError::InvalidRecipient)?;
        if self.amount.is_zero() {
            return Err(BuildError::InvalidAmount);
        }
        Ok(())
    }

    /// The bytes every signature over this transaction covers.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical::canonical_bytes(self)
    }

    pub fn tx_type(&self) -> TransactionType {
        self.tx_type
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    /// Unix seconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn text_data(&self) -> &str {
        &self.text_data
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Extra info as stored: a JSON object string, or `""`.
    pub fn extra_info(&self) -> &str {
        &self.extra_info
    }

    /// Base64 proof blob, if one is attached.
    pub fn zk_proof(&self) -> Option<&str> {
        (!self.zk_proof.is_empty()).then_some(self.zk_proof.as_str())
    }

    /// Base64 public-witness blob, if one is attached.
    pub fn zk_pub(&self) -> Option<&str> {
        (!self.zk_pub.is_empty()).then_some(self.zk_pub.as_str())
    }

    /// A builder pre-filled with this transaction's fields.
    pub fn to_builder(&self) -> TransactionBuilder {
        TransactionBuilder {
            tx_type: self.tx_type,
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
            amount: self.amount.clone(),
            nonce: self.nonce,
            timestamp: Some(self.timestamp),
            text_data: self.text_data.clone(),
            extra_info: self.extra_info.clone(),
            zk_proof: self.zk_proof.clone(),
            zk_pub: self.zk_pub.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Transaction`].
///
/// ```
/// use mmn_protocol::crypto::MmnKeypair;
/// use mmn_protocol::transaction::{TransactionBuilder, TransactionType};
///
/// let alice = MmnKeypair::generate();
/// let bob = MmnKeypair::generate();
/// let tx = TransactionBuilder::new(TransactionType::TransferByKey)
///     .sender(&alice.address())
///     .recipient(&bob.address())
///     .amount(1000u64)
///     .nonce(1)
///     .build()
///     .unwrap();
/// assert_eq!(tx.nonce(), 1);
/// ```
///
/// `timestamp` defaults to the current UTC time in seconds.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx_type: TransactionType,
    sender: String,
    recipient: String,
    amount: Amount,
    nonce: u64,
    timestamp: Option<u64>,
    text_data: String,
    extra_info: String,
    zk_proof: String,
    zk_pub: String,
}

impl TransactionBuilder {
    pub fn new(tx_type: TransactionType) -> Self {
        Self {
            tx_type,
            sender: String::new(),
            recipient: String::new(),
            amount: Amount::zero(),
            nonce: 0,
            timestamp: None,
            text_data: String::new(),
            extra_info: String::new(),
            zk_proof: String::new(),
            zk_pub: String::new(),
        }
    }

    pub fn tx_type(mut self, tx_type: TransactionType) -> Self {
        self.tx_type = tx_type;
        self
    }

    pub fn sender(mut self, address: &str) -> Self {
        self.sender = address.to_string();
        self
    }

    pub fn recipient(mut self, address: &str) -> Self {
        self.recipient = address.to_string();
        self
    }

    pub fn amount(mut self, amount: impl Into<Amount>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Unix seconds. If not called, `build()` uses the current time.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn text_data(mut self, text: &str) -> Self {
        self.text_data = text.to_string();
        self
    }

    pub fn extra_info(mut self, extra: ExtraInfo) -> Self {
        self.extra_info = serialize_extra_info(Some(&extra));
        self
    }

    /// Attach a base64 proof and base64 public witness.
    pub fn zk_proof(mut self, proof: &str, public_witness: &str) -> Self {
        self.zk_proof = proof.to_string();
        self.zk_pub = public_witness.to_string();
        self
    }

    pub fn build(self) -> Result<Transaction, BuildError> {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp().max(0) as u64);

        let tx = Transaction {
            tx_type: self.tx_type,
            sender: self.sender,
            recipient: self.recipient,
            amount: self.amount,
            timestamp,
            text_data: self.text_data,
            nonce: self.nonce,
            extra_info: self.extra_info,
            zk_proof: self.zk_proof,
            zk_pub: self.zk_pub,
        };
        tx.validate()?;
        Ok(tx)
    }
}

/// Flat constructor mirroring the other SDKs' `BuildTransferTx`.
#[allow(clippy::too_many_arguments)]
pub fn build_transaction(
    tx_type: TransactionType,
    sender: &str,
    recipient: &str,
    amount: Amount,
    nonce: u64,
    timestamp: u64,
    text_data: &str,
    extra_info: Option<ExtraInfo>,
    zk_proof: Option<(&str, &str)>,
) -> Result<Transaction, BuildError> {
    let mut builder = TransactionBuilder::new(tx_type)
        .sender(sender)
        .recipient(recipient)
        .amount(amount)
        .nonce(nonce)
        .timestamp(timestamp)
        .text_data(text_data);
    if let Some(extra) = extra_info {
        builder = builder.extra_info(extra);
    }
    if let Some((proof, witness)) = zk_proof {
        builder = builder.zk_proof(proof, witness);
    }
    builder.build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
