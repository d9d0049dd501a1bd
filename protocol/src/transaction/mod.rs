//! # Transaction Module
//!
//! Construction, canonical encoding, signing and acceptance of MMN
//! transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — TransactionType, Amount, extra-info helpers
//! builder.rs      — Transaction and its validating builder
//! canonical.rs    — the byte encoding every signature covers
//! address.rs      — address format, derivation and curve membership
//! signing.rs      — direct and enveloped signatures
//! verification.rs — the acceptance gate ledger nodes run
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build** with [`TransactionBuilder`]; bad addresses or a zero amount
//!    stop here.
//! 2. **Sign** with [`sign_transaction`], which picks the signature layout
//!    from the transaction type.
//! 3. **Submit** the [`SignedTransaction`] through a
//!    [`LedgerClient`](crate::client::LedgerClient).
//! 4. **Accept**: nodes run [`verify_transaction`].

pub mod address;
pub mod builder;
pub mod canonical;
pub mod signing;
pub mod types;
pub mod verification;

pub use address::{derive_address, validate_address_format, validate_curve_membership, AddressError};
pub use builder::{build_transaction, BuildError, Transaction, TransactionBuilder};
pub use signing::{sign_transaction, verify_signature, SignedTransaction, SigningError, UserSignature};
pub use types::{Amount, AmountError, ExtraInfo, SignatureScheme, TransactionType};
pub use verification::{verify_transaction, AcceptanceError};
