// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # MMN Protocol — Trust Core
//!
//! The part of the MMN SDK that decides whether a transaction is authentic:
//! how it is encoded for signing, how it is signed, which recipients are
//! acceptable, and whether an attached zero-knowledge identity proof holds.
//!
//! Ed25519 for signatures, Groth16 over BN254 for proofs, base58 for
//! everything a user ever copies and pastes.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants and cache defaults.
//! - **crypto** — Keys, signatures and hashes.
//! - **transaction** — Building, canonical encoding, signing, acceptance.
//! - **zkp** — Identity binding circuit, witness codec, cached verifier.
//! - **client** — The ledger boundary, plus an in-memory ledger.
//!
//! ## Ground rules
//!
//! 1. Verification never panics on wire input. It answers `false` or a
//!    typed error.
//! 2. A `Transaction` value is always well-formed: addresses decode to 32
//!    bytes and the amount is positive.
//! 3. Nothing here logs key material.

pub mod client;
pub mod config;
pub mod crypto;
pub mod transaction;
pub mod zkp;
