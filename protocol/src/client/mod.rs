//! # Ledger Client
//!
//! The SDK hands signed transactions to a ledger node and reads account
//! state back. [`LedgerClient`] is that boundary; the network transport
//! behind it is someone else's concern.
//!
//! [`MemoryLedger`] is a self-contained implementation for tests and local
//! tooling. It runs the same acceptance gate as a node, tracks balances and
//! nonces, and applies each admitted transaction immediately.

use async_trait::async_trait;
use num_bigint::BigUint;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::hash::sha256;
use crate::transaction::{verify_transaction, AcceptanceError, Amount, SignedTransaction};
use crate::zkp::ZkVerifier;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub balance: Amount,
    pub nonce: u64,
}

impl Account {
    fn empty(address: &str) -> Self {
        Self {
            address: address.to_string(),
            balance: Amount::zero(),
            nonce: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTxResponse {
    pub ok: bool,
    pub tx_hash: String,
    pub error: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transaction rejected: {0}")]
    Rejected(#[from] AcceptanceError),

    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("recipient balance overflow")]
    BalanceOverflow,
}

// ---------------------------------------------------------------------------
// LedgerClient
// ---------------------------------------------------------------------------

/// What the SDK needs from a ledger node.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a signed transaction. An error means it was not admitted.
    async fn add_tx(&self, tx: SignedTransaction) -> Result<AddTxResponse, LedgerError>;

    /// Account state. Unknown addresses read as an empty account.
    async fn get_account(&self, address: &str) -> Result<Account, LedgerError>;

    /// Last nonce used by `address`. `tag` selects the view (`"latest"` or
    /// `"pending"`) on nodes that distinguish them.
    async fn get_current_nonce(&self, address: &str, tag: &str) -> Result<u64, LedgerError>;
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

/// In-memory ledger. Every admitted transaction is final immediately, so
/// `"latest"` and `"pending"` nonces are the same.
pub struct MemoryLedger {
    accounts: RwLock<HashMap<String, Account>>,
    zk: Option<Arc<ZkVerifier>>,
}

impl MemoryLedger {
    /// A ledger without a proof verifier; `TransferByZk` is always rejected.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            zk: None,
        }
    }

    pub fn with_verifier(zk: Arc<ZkVerifier>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            zk: Some(zk),
        }
    }

    /// Credit `address` out of thin air. Genesis and test setup only.
    pub fn fund(&self, address: &str, amount: Amount) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write();
        let account = accounts
            .entry(address.to_string())
            .or_insert_with(|| Account::empty(address));
        account.balance = checked_add(&account.balance, &amount)?;
        Ok(())
    }

    fn apply(&self, signed: &SignedTransaction) -> Result<String, LedgerError> {
        let tx = &signed.tx;
        let mut accounts = self.accounts.write();

        let sender = accounts
            .get(tx.sender())
            .cloned()
            .unwrap_or_else(|| Account::empty(tx.sender()));

        let expected = sender.nonce + 1;
        if tx.nonce() != expected {
            return Err(LedgerError::NonceMismatch {
                expected,
                got: tx.nonce(),
            });
        }
        if sender.balance < *tx.amount() {
            return Err(LedgerError::InsufficientBalance {
                available: sender.balance,
                required: tx.amount().clone(),
            });
        }

        let recipient_balance = accounts
            .get(tx.recipient())
            .map(|a| a.balance.clone())
            .unwrap_or_else(Amount::zero);
        let sender_balance = sender.balance.as_biguint() - tx.amount().as_biguint();

        // A self-transfer nets to zero, so only the nonce moves.
        if tx.sender() != tx.recipient() {
            let credited = checked_add(&recipient_balance, tx.amount())?;
            accounts
                .entry(tx.recipient().to_string())
                .or_insert_with(|| Account::empty(tx.recipient()))
                .balance = credited;
        }

        let account = accounts
            .entry(tx.sender().to_string())
            .or_insert_with(|| Account::empty(tx.sender()));
        account.nonce = tx.nonce();
        if tx.sender() != tx.recipient() {
            account.balance = amount_from(sender_balance)?;
        }

        Ok(hex::encode(sha256(&tx.canonical_bytes())))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_add(a: &Amount, b: &Amount) -> Result<Amount, LedgerError> {
    amount_from(a.as_biguint() + b.as_biguint())
}

fn amount_from(value: BigUint) -> Result<Amount, LedgerError> {
    Amount::from_biguint(value).map_err(|_| LedgerError::BalanceOverflow)
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn add_tx(&self, tx: SignedTransaction) -> Result<AddTxResponse, LedgerError> {
        if let Err(e) = verify_transaction(&tx.tx, &tx.signature, self.zk.as_deref()) {
            debug!(sender = tx.tx.sender(), error = %e, "memory ledger rejected transaction");
            return Err(e.into());
        }
        let tx_hash = self.apply(&tx)?;
        info!(
            tx_hash = %tx_hash,
            tx_type = %tx.tx.tx_type(),
            amount = %tx.tx.amount(),
            "transaction applied"
        );
        Ok(AddTxResponse {
            ok: true,
            tx_hash,
            error: String::new(),
        })
    }

    async fn get_account(&self, address: &str) -> Result<Account, LedgerError> {
        Ok(self
            .accounts
            .read()
            .get(address)
            .cloned()
            .unwrap_or_else(|| Account::empty(address)))
    }

    async fn get_current_nonce(&self, address: &str, _tag: &str) -> Result<u64, LedgerError> {
        Ok(self.accounts.read().get(address).map(|a| a.nonce).unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
